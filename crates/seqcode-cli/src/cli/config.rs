use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use seqcode::{ConfigType, IssueRequest, ParamPolicy, Params, ServiceOptions};

/// Runtime configuration for the `seqcode` binary.
///
/// Every option can also be provided through the environment (or a `.env`
/// file), which makes the binary usable from scripts that only know an entity
/// name.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqcode",
    version,
    about = "Issue business numbers and barcodes from template configurations"
)]
pub struct CliArgs {
    /// JSON state file holding `configs`, and optionally the `records` and
    /// `associations` left by earlier runs.
    ///
    /// Environment variable: `SEQCODE_STATE`
    #[arg(long, env = "SEQCODE_STATE")]
    pub state: PathBuf,

    /// Entity class name the code is issued for.
    ///
    /// Environment variable: `SEQCODE_ENTITY`
    #[arg(long, env = "SEQCODE_ENTITY")]
    pub entity: String,

    /// Tenant the configuration belongs to.
    ///
    /// Environment variable: `SEQCODE_TENANT`
    #[arg(long, env = "SEQCODE_TENANT")]
    pub tenant: Option<String>,

    /// Isolation code partitioning the counter (warehouse, business unit).
    /// Falls back to `--default-isolation`.
    ///
    /// Environment variable: `SEQCODE_ISOLATION`
    #[arg(long, env = "SEQCODE_ISOLATION")]
    pub isolation: Option<String>,

    /// Isolation code used when none is given.
    ///
    /// Environment variable: `SEQCODE_DEFAULT_ISOLATION`
    #[arg(long, env = "SEQCODE_DEFAULT_ISOLATION", default_value_t = String::from(seqcode::DEFAULT_ISOLATION))]
    pub default_isolation: String,

    /// Number of codes to issue.
    ///
    /// Environment variable: `SEQCODE_COUNT`
    #[arg(short = 'n', long, env = "SEQCODE_COUNT", default_value_t = 1)]
    pub count: usize,

    /// Template parameter as `name=value`. May be repeated.
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Business reference a barcode is associated with. Requires `--barcode`.
    #[arg(long)]
    pub reference: Option<String>,

    /// Issue from the entity's barcode configuration instead of its number
    /// configuration.
    #[arg(short, long, default_value_t = false)]
    pub barcode: bool,

    /// Reject requests that leave a template parameter unset.
    ///
    /// Environment variable: `SEQCODE_STRICT_PARAMS`
    #[arg(long, env = "SEQCODE_STRICT_PARAMS", default_value_t = false)]
    pub strict_params: bool,

    /// Run without a shared cache. Every code is calibrated from the state
    /// file alone.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Write records and associations back to the state file when done.
    #[arg(long, default_value_t = false)]
    pub save: bool,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub state: PathBuf,
    pub config_type: ConfigType,
    pub request: IssueRequest,
    pub count: usize,
    pub options: ServiceOptions,
    pub use_cache: bool,
    pub save: bool,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.entity.trim().is_empty() {
            bail!("SEQCODE_ENTITY must not be blank");
        }

        if args.count == 0 {
            bail!("SEQCODE_COUNT must be greater than 0");
        }

        if args.default_isolation.trim().is_empty() {
            bail!("SEQCODE_DEFAULT_ISOLATION must not be blank");
        }

        if args.reference.is_some() && !args.barcode {
            bail!("--reference only applies to barcodes; add --barcode");
        }

        let params = parse_params(&args.params)?;

        let mut request = IssueRequest::new(args.entity).params(params);
        if let Some(tenant) = args.tenant {
            request = request.tenant(tenant);
        }
        if let Some(isolation) = args.isolation {
            request = request.isolation(isolation);
        }
        if let Some(reference) = args.reference {
            request = request.reference(reference);
        }

        let config_type = if args.barcode {
            ConfigType::Barcode
        } else {
            ConfigType::Number
        };

        let param_policy = if args.strict_params {
            ParamPolicy::Strict
        } else {
            ParamPolicy::Lenient
        };

        Ok(Self {
            state: args.state,
            config_type,
            request,
            count: args.count,
            options: ServiceOptions {
                param_policy,
                default_isolation: args.default_isolation,
            },
            use_cache: !args.no_cache,
            save: args.save,
        })
    }
}

fn parse_params(raw: &[String]) -> anyhow::Result<Params> {
    raw.iter()
        .map(|pair| -> anyhow::Result<(String, String)> {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("parameter `{pair}` is not of the form NAME=VALUE"))?;
            if name.is_empty() {
                bail!("parameter `{pair}` has an empty name");
            }
            Ok((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<RunConfig> {
        let args = ["seqcode", "--state", "state.json", "--entity", "Order"]
            .into_iter()
            .chain(extra.iter().copied());
        RunConfig::try_from(CliArgs::try_parse_from(args)?)
    }

    #[test]
    fn defaults_issue_one_lenient_number() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.config_type, ConfigType::Number);
        assert_eq!(config.count, 1);
        assert_eq!(config.options.param_policy, ParamPolicy::Lenient);
        assert_eq!(config.options.default_isolation, seqcode::DEFAULT_ISOLATION);
        assert!(config.use_cache);
        assert!(!config.save);
        assert_eq!(config.request.entity, "Order");
        assert!(config.request.params.is_empty());
    }

    #[test]
    fn params_split_on_the_first_equals_sign() {
        let config = parse(&["-p", "dept=HR", "--param", "note=a=b"]).unwrap();
        assert_eq!(config.request.params["dept"], "HR");
        assert_eq!(config.request.params["note"], "a=b");
    }

    #[test]
    fn malformed_params_are_rejected() {
        assert!(parse(&["-p", "dept"]).is_err());
        assert!(parse(&["-p", "=HR"]).is_err());
    }

    #[test]
    fn reference_requires_barcode() {
        assert!(parse(&["--reference", "REF-1"]).is_err());

        let config = parse(&["--barcode", "--reference", "REF-1"]).unwrap();
        assert_eq!(config.config_type, ConfigType::Barcode);
        assert_eq!(config.request.reference_id.as_deref(), Some("REF-1"));
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(parse(&["-n", "0"]).is_err());
    }

    #[test]
    fn flags_map_onto_run_config() {
        let config = parse(&[
            "--tenant",
            "acme",
            "--isolation",
            "wh-1",
            "--strict-params",
            "--no-cache",
            "--save",
            "-n",
            "3",
        ])
        .unwrap();
        assert_eq!(config.request.tenant.as_deref(), Some("acme"));
        assert_eq!(config.request.isolation.as_deref(), Some("wh-1"));
        assert_eq!(config.options.param_policy, ParamPolicy::Strict);
        assert!(!config.use_cache);
        assert!(config.save);
        assert_eq!(config.count, 3);
    }
}
