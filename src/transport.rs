//! Upstream Transport
//!
//! Trait-based abstraction over the outbound HTTP GET both lookups issue,
//! so the resolvers can run against an in-memory fake in tests.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::UpstreamError;

/// Header carrying the API key on every upstream call
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Outbound request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub api_key: String,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

/// What came back from the upstream, before any interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    /// `None` when the upstream sent no body at all
    pub body: Option<Vec<u8>>,
}

/// Capability to issue an authenticated GET
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, request: UpstreamRequest) -> Result<RawResponse, UpstreamError>;
}

/// Production transport backed by a pooled `reqwest::Client`
///
/// The client is cheap to clone and safe to share between concurrent
/// resolve calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent(concat!("cluster-resolver/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::transport("<client>", e.to_string()))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestTransport {
    async fn fetch(&self, request: UpstreamRequest) -> Result<RawResponse, UpstreamError> {
        let UpstreamRequest { url, api_key } = request;

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| {
                debug!(url = %url, error = %e, "Upstream request failed");
                UpstreamError::from_reqwest(url.clone(), e)
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url.clone(), e))?;

        Ok(RawResponse {
            url,
            status,
            body: Some(body.to_vec()),
        })
    }
}
