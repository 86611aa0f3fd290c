//! Error types for cluster resolution
//!
//! `UpstreamError` describes what went wrong talking to one directory
//! service. `ClusterInfoError` says which of the two lookups it came from.

use thiserror::Error;

/// Failure of a single call to an upstream directory service
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The outbound request could not be built (bad header value, bad URL)
    #[error("failed to build request for {url}: {message}")]
    Request { url: String, message: String },

    /// Network or connection failure
    #[error("transport error calling {url}: {message}")]
    Transport {
        url: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Upstream answered with something other than 200 OK
    #[error("upstream {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Upstream answered without a body at all
    #[error("upstream {url} returned no response body, status {status}")]
    EmptyBody { url: String, status: u16 },

    /// Body was not valid JSON of the expected shape
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// The URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::EmptyBody { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }

    /// HTTP status observed upstream, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::EmptyBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a reqwest failure: builder errors are request errors,
    /// everything else is transport.
    pub fn from_reqwest(url: impl Into<String>, err: reqwest::Error) -> Self {
        let url = url.into();
        if err.is_builder() {
            return Self::request(url, err.to_string());
        }
        Self::Transport {
            message: err.to_string(),
            url,
            source: Some(err),
        }
    }
}

/// Errors surfaced to callers of `ClusterInfoProvider::resolve`
#[derive(Debug, Error)]
pub enum ClusterInfoError {
    /// Step one: the flow directory lookup failed
    #[error("failed to get the api flow: {0}")]
    FlowLookup(#[source] UpstreamError),

    /// Step two: the bucket clusters lookup failed
    #[error("failed to get the api bucket clusters: {0}")]
    BucketClustersLookup(#[source] UpstreamError),

    /// A required host or credential is not configured
    #[error("misconfiguration: {0}")]
    Configuration(String),

    /// No cluster in the bucket carries the requested identifier
    #[error("cluster {identifier} not found in bucket {bucket}")]
    ClusterNotFound { bucket: String, identifier: String },
}

impl ClusterInfoError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The upstream error behind this failure, if any
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            Self::FlowLookup(e) | Self::BucketClustersLookup(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status that caused the failure, when it was a non-OK answer
    pub fn status(&self) -> Option<u16> {
        self.upstream().and_then(UpstreamError::status)
    }
}
