//! Resolver Configuration
//!
//! Upstream hosts and the master API key, read once at startup.
//!
//! ## Environment
//!
//! - `KUBE_PROXY_RIVER_HOST`: flow directory host (e.g. `river-staging.example.io`)
//! - `KUBE_PROXY_AUTHENTICATOR_HOST`: cluster directory host
//! - `KUBE_PROXY_MASTER_API_KEY`: privileged key for the cluster directory
//! - `KUBE_PROXY_UPSTREAM_SCHEME`: `https` unless testing locally
//! - `KUBE_PROXY_UPSTREAM_TIMEOUT_SECS`: per-request timeout, default 30

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{ClusterInfoError, UpstreamError};

pub const ENV_FLOW_HOST: &str = "KUBE_PROXY_RIVER_HOST";
pub const ENV_CLUSTER_HOST: &str = "KUBE_PROXY_AUTHENTICATOR_HOST";
pub const ENV_MASTER_API_KEY: &str = "KUBE_PROXY_MASTER_API_KEY";
pub const ENV_SCHEME: &str = "KUBE_PROXY_UPSTREAM_SCHEME";
pub const ENV_TIMEOUT_SECS: &str = "KUBE_PROXY_UPSTREAM_TIMEOUT_SECS";

const DEFAULT_SCHEME: &str = "https";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable process configuration shared by both lookups
#[derive(Clone)]
pub struct ResolverConfig {
    /// Flow directory host
    pub flow_host: String,
    /// Cluster directory host
    pub cluster_host: String,
    /// Privileged key for the cluster directory, never the caller's key
    pub master_api_key: String,
    /// URL scheme for both upstreams
    pub scheme: String,
    /// Outbound request timeout
    pub timeout: Duration,
}

impl ResolverConfig {
    pub fn new(
        flow_host: impl Into<String>,
        cluster_host: impl Into<String>,
        master_api_key: impl Into<String>,
    ) -> Self {
        Self {
            flow_host: flow_host.into(),
            cluster_host: cluster_host.into(),
            master_api_key: master_api_key.into(),
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment.
    ///
    /// Missing variables become empty strings; the readiness checks report
    /// them when a lookup is attempted.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();

        let timeout = env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let scheme = env::var(ENV_SCHEME)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

        Self {
            flow_host: var(ENV_FLOW_HOST),
            cluster_host: var(ENV_CLUSTER_HOST),
            master_api_key: var(ENV_MASTER_API_KEY),
            scheme,
            timeout: Duration::from_secs(timeout),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check everything the flow lookup needs
    pub fn ensure_flow_ready(&self) -> Result<(), ClusterInfoError> {
        self.ensure_scheme()?;
        require(&self.flow_host, ENV_FLOW_HOST)
    }

    /// Check everything the bucket clusters lookup needs
    pub fn ensure_cluster_ready(&self) -> Result<(), ClusterInfoError> {
        self.ensure_scheme()?;
        require(&self.cluster_host, ENV_CLUSTER_HOST)?;
        require(&self.master_api_key, ENV_MASTER_API_KEY)
    }

    fn ensure_scheme(&self) -> Result<(), ClusterInfoError> {
        match self.scheme.as_str() {
            "https" | "http" => Ok(()),
            other => Err(ClusterInfoError::configuration(format!(
                "{} must be http or https, got {:?}",
                ENV_SCHEME, other
            ))),
        }
    }

    pub fn flow_url(&self, flow_id: &str) -> Result<String, UpstreamError> {
        let segment = path_segment(&self.flow_host, flow_id)?;
        Ok(format!("{}://{}/flows/{}", self.scheme, self.flow_host, segment))
    }

    pub fn bucket_clusters_url(&self, bucket_uuid: &str) -> Result<String, UpstreamError> {
        let segment = path_segment(&self.cluster_host, bucket_uuid)?;
        Ok(format!(
            "{}://{}/api/bucket/{}/clusters",
            self.scheme, self.cluster_host, segment
        ))
    }
}

/// Percent-encode an id so it stays a single path segment.
///
/// Empty and dot-only ids cannot be expressed as a segment: URL parsing
/// resolves `.`/`..` (encoded or not) against the parent path.
fn path_segment(host: &str, id: &str) -> Result<String, UpstreamError> {
    if matches!(id, "" | "." | "..") {
        return Err(UpstreamError::request(
            host,
            format!("{:?} is not a valid path segment", id),
        ));
    }
    Ok(urlencoding::encode(id).into_owned())
}

fn require(value: &str, name: &str) -> Result<(), ClusterInfoError> {
    if value.trim().is_empty() {
        return Err(ClusterInfoError::configuration(format!(
            "{} is not set",
            name
        )));
    }
    Ok(())
}

impl fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("flow_host", &self.flow_host)
            .field("cluster_host", &self.cluster_host)
            .field("master_api_key", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = ResolverConfig::new("river.test", "auth.test", "master");
        assert_eq!(config.flow_url("f-1").unwrap(), "https://river.test/flows/f-1");
        assert_eq!(
            config.bucket_clusters_url("b-1").unwrap(),
            "https://auth.test/api/bucket/b-1/clusters"
        );
    }

    #[test]
    fn test_ids_stay_one_path_segment() {
        let config = ResolverConfig::new("river.test", "auth.test", "master");

        let url = config.flow_url("f?x#y").unwrap();
        assert_eq!(url, "https://river.test/flows/f%3Fx%23y");
        let parsed = reqwest::Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/flows/f%3Fx%23y");
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.fragment(), None);

        let url = config.bucket_clusters_url("a b%c/d").unwrap();
        assert_eq!(url, "https://auth.test/api/bucket/a%20b%25c%2Fd/clusters");
        assert_eq!(
            reqwest::Url::parse(&url).unwrap().path(),
            "/api/bucket/a%20b%25c%2Fd/clusters"
        );

        let url = config.flow_url("..x").unwrap();
        assert_eq!(reqwest::Url::parse(&url).unwrap().path(), "/flows/..x");
    }

    #[test]
    fn test_dot_and_empty_ids_rejected() {
        let config = ResolverConfig::new("river.test", "auth.test", "master");
        for id in ["", ".", ".."] {
            assert!(matches!(
                config.flow_url(id),
                Err(UpstreamError::Request { .. })
            ));
            assert!(matches!(
                config.bucket_clusters_url(id),
                Err(UpstreamError::Request { .. })
            ));
        }
    }

    #[test]
    fn test_flow_ready_ignores_cluster_settings() {
        let config = ResolverConfig::new("river.test", "", "");
        assert!(config.ensure_flow_ready().is_ok());

        let err = config.ensure_cluster_ready().unwrap_err();
        assert!(err.to_string().contains(ENV_CLUSTER_HOST));
    }

    #[test]
    fn test_missing_master_key_is_reported() {
        let config = ResolverConfig::new("river.test", "auth.test", "  ");
        let err = config.ensure_cluster_ready().unwrap_err();
        assert!(matches!(err, ClusterInfoError::Configuration(_)));
        assert!(err.to_string().contains(ENV_MASTER_API_KEY));
    }

    #[test]
    fn test_missing_flow_host_is_reported() {
        let config = ResolverConfig::new("", "auth.test", "master");
        let err = config.ensure_flow_ready().unwrap_err();
        assert!(err.to_string().contains(ENV_FLOW_HOST));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let config = ResolverConfig::new("river.test", "auth.test", "master").with_scheme("ftp");
        assert!(config.ensure_flow_ready().is_err());
        assert!(config.ensure_cluster_ready().is_err());
    }

    #[test]
    fn test_from_env() {
        env::set_var(ENV_FLOW_HOST, "river.env.test");
        env::set_var(ENV_CLUSTER_HOST, "auth.env.test");
        env::remove_var(ENV_MASTER_API_KEY);
        env::set_var(ENV_TIMEOUT_SECS, "not-a-number");
        env::remove_var(ENV_SCHEME);

        let config = ResolverConfig::from_env();

        assert_eq!(config.flow_host, "river.env.test");
        assert_eq!(config.cluster_host, "auth.env.test");
        assert!(config.master_api_key.is_empty());
        assert_eq!(config.scheme, "https");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.ensure_flow_ready().is_ok());
        assert!(config.ensure_cluster_ready().is_err());
    }

    #[test]
    fn test_debug_redacts_master_key() {
        let config = ResolverConfig::new("river.test", "auth.test", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
