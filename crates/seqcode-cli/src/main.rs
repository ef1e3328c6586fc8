#![doc = include_str!("../README.md")]

mod cli;

use std::{io::Write, sync::Arc};

use clap::Parser;
use cli::config::{CliArgs, RunConfig};
use cli::state::StateFile;
use cli::telemetry::init_telemetry;
use seqcode::{MemoryCache, RecordWriter, SerialService, SharedCache};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let state = StateFile::load(&config.state)?;
    let configs = state.configs.clone();
    let store = Arc::new(state.into_store()?);

    let cache: Option<Arc<dyn SharedCache>> = if config.use_cache {
        Some(Arc::new(MemoryCache::new()))
    } else {
        None
    };

    let (publisher, writer) = RecordWriter::spawn(store.clone());
    let service = SerialService::new(store.clone(), cache)
        .with_publisher(Arc::new(publisher))
        .with_options(config.options.clone());

    let issued = issue_codes(Arc::new(service), &config).await;

    // Drain pending records whether or not issuance succeeded.
    let written = writer.shutdown().await;
    tracing::debug!("Applied {written} isolation records");

    if config.save {
        StateFile::capture(configs, &store).save(&config.state)?;
        tracing::info!("Saved state to {}", config.state.display());
    }

    let issued = issued?;
    tracing::info!("Issued {issued} of {} codes", config.count);
    Ok(())
}

/// Issues up to `config.count` codes, printing each as soon as it is issued.
///
/// Stops early on Ctrl+C or SIGTERM. Returns how many codes were printed.
async fn issue_codes(service: Arc<SerialService>, config: &RunConfig) -> anyhow::Result<usize> {
    issue_until(service, config, shutdown_signal(), &mut std::io::stdout()).await
}

/// Issues codes into `out` until `config.count` is reached or `shutdown`
/// completes.
///
/// An issuance already running when `shutdown` completes has drawn its number,
/// so it is awaited and written before stopping.
async fn issue_until(
    service: Arc<SerialService>,
    config: &RunConfig,
    shutdown: impl Future<Output = ()>,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    tokio::pin!(shutdown);

    let mut issued = 0;
    for _ in 0..config.count {
        let service = service.clone();
        let request = config.request.clone();
        let config_type = config.config_type;
        let mut next = tokio::task::spawn_blocking(move || service.issue(config_type, &request));

        tokio::select! {
            biased;
            code = &mut next => {
                writeln!(out, "{}", code??)?;
                issued += 1;
            }
            () = &mut shutdown => {
                writeln!(out, "{}", next.await??)?;
                issued += 1;
                tracing::info!("Shutdown signal received, stopping after {issued} codes");
                break;
            }
        }
    }
    Ok(issued)
}

fn log_startup_info(config: &RunConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting seqcode with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Issuing {} {} codes for {}",
            config.count,
            config.config_type,
            config.request.entity
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use seqcode::{ConfigType, IssueRequest, MemoryStore, SerialConfig, ServiceOptions, SharedCache};

    use super::*;

    fn run_config(count: usize) -> RunConfig {
        RunConfig {
            state: PathBuf::from("state.json"),
            config_type: ConfigType::Number,
            request: IssueRequest::new("Ticket").tenant("acme"),
            count,
            options: ServiceOptions::default(),
            use_cache: true,
            save: false,
        }
    }

    fn ticket_service() -> (Arc<SerialService>, Arc<MemoryCache>) {
        let config = SerialConfig::new("cfg-t", "Ticket", ConfigType::Number, "T#{000}", "acme");
        let store = Arc::new(MemoryStore::with_configs([config]));
        let cache = Arc::new(MemoryCache::new());
        let shared: Arc<dyn SharedCache> = cache.clone();
        (Arc::new(SerialService::new(store, Some(shared))), cache)
    }

    #[tokio::test]
    async fn issues_the_requested_count() {
        let (service, _cache) = ticket_service();
        let mut out = Vec::new();

        let issued = issue_until(service, &run_config(3), std::future::pending(), &mut out)
            .await
            .unwrap();
        assert_eq!(issued, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "T001\nT002\nT003\n");
    }

    #[tokio::test]
    async fn shutdown_prints_the_issuance_in_flight() {
        let (service, cache) = ticket_service();
        let mut out = Vec::new();

        let issued = issue_until(service, &run_config(5), std::future::ready(()), &mut out)
            .await
            .unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(issued >= 1);
        assert_eq!(printed.lines().count(), issued);
        assert!(printed.starts_with("T001\n"));

        let drawn: usize = cache
            .keys_matching("*")
            .unwrap()
            .iter()
            .filter_map(|key| cache.counter(key))
            .map(|n| n as usize)
            .sum();
        assert_eq!(drawn, issued);
    }
}
