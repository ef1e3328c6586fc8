use crate::{DEFAULT_ISOLATION, ParamPolicy, Params};

/// Construction-time settings of a [`SerialService`](crate::SerialService).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceOptions {
    /// How absent `${param}` values are handled.
    pub param_policy: ParamPolicy,
    /// Isolation code used when a request names none.
    pub default_isolation: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            param_policy: ParamPolicy::default(),
            default_isolation: DEFAULT_ISOLATION.to_string(),
        }
    }
}

/// One caller's request for a code.
///
/// ```
/// use seqcode::IssueRequest;
///
/// let request = IssueRequest::new("com.acme.Parcel")
///     .tenant("acme")
///     .isolation("wh-2")
///     .param("dept", "HR")
///     .reference("REF-1");
/// assert_eq!(request.params["dept"], "HR");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueRequest {
    /// Stable name of the entity the code is for.
    pub entity: String,
    pub tenant: Option<String>,
    pub isolation: Option<String>,
    pub params: Params,
    /// Business object a barcode is associated with.
    pub reference_id: Option<String>,
}

impl IssueRequest {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    #[must_use]
    pub fn isolation(mut self, isolation: impl Into<String>) -> Self {
        self.isolation = Some(isolation.into());
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    #[must_use]
    pub fn reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }
}
