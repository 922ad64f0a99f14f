//! Error taxonomy shared by adapters, the aggregation service and the
//! HTTP surface.

use crate::models::Source;

/// Every failure a caller of the character service can observe.
///
/// Client errors ([`InvalidSource`](TallyError::InvalidSource),
/// [`Misconfigured`](TallyError::Misconfigured),
/// [`InvalidInput`](TallyError::InvalidInput)) are kept apart from service
/// errors so the HTTP layer can map them to 4xx and 5xx respectively.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("source '{catalog}' is not configured: {reason}")]
    Misconfigured { catalog: Source, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no character sources available")]
    NoSourcesAvailable,

    #[error("upstream '{catalog}' unavailable: {reason}")]
    UpstreamUnavailable { catalog: Source, reason: String },

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl TallyError {
    /// Shorthand for an upstream failure tagged with its source.
    pub fn upstream(catalog: Source, reason: impl Into<String>) -> Self {
        TallyError::UpstreamUnavailable {
            catalog,
            reason: reason.into(),
        }
    }

    /// Machine-readable error code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            TallyError::InvalidSource(_) => "invalid_source",
            TallyError::Misconfigured { .. } => "misconfigured",
            TallyError::InvalidInput(_) => "bad_request",
            TallyError::NoSourcesAvailable => "no_sources_available",
            TallyError::UpstreamUnavailable { .. } => "upstream_unavailable",
            TallyError::Storage(_) => "storage_failure",
        }
    }

    /// True when the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TallyError::InvalidSource(_)
                | TallyError::Misconfigured { .. }
                | TallyError::InvalidInput(_)
        )
    }
}
