//! Outbound HTTP transport for source adapters.
//!
//! Adapters never talk to `reqwest` directly: they go through the
//! [`HttpTransport`] trait so tests can substitute canned responses. The
//! production implementation is [`ReqwestTransport`].

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use character_tally_core::{Source, TallyError};

/// Status and raw body of an upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests on behalf of adapters.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a GET. Non-2xx statuses are returned, not raised; only
    /// transport-level failures (DNS, connect, timeout) are errors.
    ///
    /// Errors must not carry the request URL: some adapters embed
    /// credentials in the path.
    async fn get(&self, url: &str) -> Result<UpstreamResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("character-tally/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<UpstreamResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(UpstreamResponse { status, body })
    }
}

/// GET `url` and decode a JSON body of type `T`.
///
/// Every failure becomes [`TallyError::UpstreamUnavailable`] tagged with
/// `source`. `what` describes the request in errors and logs; it must not
/// contain credentials.
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    source: Source,
    url: &str,
    what: &str,
) -> Result<T, TallyError> {
    let response = transport.get(url).await.map_err(|e| {
        tracing::warn!(%source, what, error = %e, "upstream request failed");
        TallyError::upstream(source, format!("{} request failed: {}", what, e))
    })?;

    if !response.is_success() {
        tracing::warn!(%source, what, status = response.status, "upstream returned non-success");
        return Err(TallyError::upstream(
            source,
            format!("{} returned HTTP {}", what, response.status),
        ));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!(%source, what, error = %e, "malformed upstream body");
        TallyError::upstream(source, format!("{} returned a malformed body: {}", what, e))
    })
}
