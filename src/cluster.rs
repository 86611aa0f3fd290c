//! Cluster Directory Client
//!
//! Lists the clusters registered under a bucket. Uses the process-wide
//! master API key; the response carries cluster passwords in cleartext.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::decoder::{decode_json, null_as_default, read_body};
use crate::error::{ClusterInfoError, UpstreamError};
use crate::transport::{HttpFetch, UpstreamRequest};

/// A compute cluster registered under a bucket
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub identifier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    /// Backend kind, e.g. "kubernetes"
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub cluster_type: String,
}

impl ClusterRecord {
    /// True for the zero-valued record returned when nothing matched
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with the password blanked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = "<redacted>".to_string();
        }
        copy
    }
}

impl fmt::Debug for ClusterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRecord")
            .field("identifier", &self.identifier)
            .field("address", &self.address)
            .field("version", &self.version)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cluster_type", &self.cluster_type)
            .finish()
    }
}

/// Reads bucket clusters from the cluster directory
pub struct BucketClusterLookup {
    config: Arc<ResolverConfig>,
    transport: Arc<dyn HttpFetch>,
}

impl BucketClusterLookup {
    pub fn new(config: Arc<ResolverConfig>, transport: Arc<dyn HttpFetch>) -> Self {
        Self { config, transport }
    }

    /// Fetch every cluster registered under `bucket_uuid`
    pub async fn list_clusters(&self, bucket_uuid: &str) -> Result<Vec<ClusterRecord>, UpstreamError> {
        let url = self.config.bucket_clusters_url(bucket_uuid)?;
        debug!(url = %url, "Fetching bucket clusters");

        let response = self
            .transport
            .fetch(UpstreamRequest::get(
                url.clone(),
                self.config.master_api_key.as_str(),
            ))
            .await;

        let body = read_body(response).map_err(|e| {
            debug!(url = %url, error = %e, "Error during bucket clusters request");
            e
        })?;

        decode_json(&url, &body)
    }
}

/// Pick the cluster whose identifier matches.
///
/// Scans the whole list; a later match replaces an earlier one. With no
/// match the zero-valued record is returned.
pub fn select_cluster(clusters: Vec<ClusterRecord>, identifier: &str) -> ClusterRecord {
    let mut target = ClusterRecord::default();
    for cluster in clusters {
        if cluster.identifier != identifier {
            continue;
        }
        target = cluster;
    }
    target
}

/// Like `select_cluster`, but a miss is an error
pub fn select_cluster_strict(
    clusters: Vec<ClusterRecord>,
    bucket_uuid: &str,
    identifier: &str,
) -> Result<ClusterRecord, ClusterInfoError> {
    clusters
        .into_iter()
        .filter(|c| c.identifier == identifier)
        .last()
        .ok_or_else(|| ClusterInfoError::ClusterNotFound {
            bucket: bucket_uuid.to_string(),
            identifier: identifier.to_string(),
        })
}
