//! Cluster Resolution
//!
//! Two chained lookups with different credentials:
//!
//! 1. flow directory, caller's API key: flow id -> team bucket
//! 2. cluster directory, master API key: bucket -> registered clusters
//!
//! The requested cluster is then picked out of the bucket's list.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cluster::{select_cluster, select_cluster_strict, BucketClusterLookup, ClusterRecord};
use crate::config::ResolverConfig;
use crate::error::ClusterInfoError;
use crate::flow::{FlowRecord, FlowResolver};
use crate::transport::{HttpFetch, ReqwestTransport};

/// Capability exposed to the proxy
#[async_trait]
pub trait ClusterInfoProvider: Send + Sync {
    /// Resolve the cluster `cluster_id` of flow `flow_id`.
    ///
    /// A cluster id missing from the bucket yields the zero-valued record
    /// rather than an error.
    async fn resolve(
        &self,
        api_key: &str,
        flow_id: &str,
        cluster_id: &str,
    ) -> Result<ClusterRecord, ClusterInfoError>;
}

/// Stateless resolver over the flow and cluster directories
pub struct ClusterInfo {
    config: Arc<ResolverConfig>,
    flows: FlowResolver,
    clusters: BucketClusterLookup,
}

impl ClusterInfo {
    /// Build a resolver with the production reqwest transport
    pub fn new(config: ResolverConfig) -> Result<Self, ClusterInfoError> {
        let transport = ReqwestTransport::new(config.timeout).map_err(|e| {
            ClusterInfoError::configuration(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a resolver over any transport
    pub fn with_transport(config: ResolverConfig, transport: Arc<dyn HttpFetch>) -> Self {
        let config = Arc::new(config);
        Self {
            flows: FlowResolver::new(config.clone(), transport.clone()),
            clusters: BucketClusterLookup::new(config.clone(), transport),
            config,
        }
    }

    /// Flow lookup alone, with the configuration check applied
    pub async fn get_flow(&self, api_key: &str, flow_id: &str) -> Result<FlowRecord, ClusterInfoError> {
        self.config.ensure_flow_ready()?;
        self.flows
            .get_flow(api_key, flow_id)
            .await
            .map_err(ClusterInfoError::FlowLookup)
    }

    /// Bucket clusters lookup alone, with the configuration check applied
    pub async fn list_clusters(&self, bucket_uuid: &str) -> Result<Vec<ClusterRecord>, ClusterInfoError> {
        self.config.ensure_cluster_ready()?;
        self.clusters
            .list_clusters(bucket_uuid)
            .await
            .map_err(ClusterInfoError::BucketClustersLookup)
    }

    /// Like `resolve`, but reports `ClusterNotFound` instead of returning
    /// an empty record.
    pub async fn resolve_strict(
        &self,
        api_key: &str,
        flow_id: &str,
        cluster_id: &str,
    ) -> Result<ClusterRecord, ClusterInfoError> {
        let (bucket_uuid, clusters) = self.fetch_bucket_clusters(api_key, flow_id).await?;
        let cluster = select_cluster_strict(clusters, &bucket_uuid, cluster_id)?;

        info!(flow = %flow_id, bucket = %bucket_uuid, cluster = %cluster_id, "Resolved cluster");
        Ok(cluster)
    }

    async fn fetch_bucket_clusters(
        &self,
        api_key: &str,
        flow_id: &str,
    ) -> Result<(String, Vec<ClusterRecord>), ClusterInfoError> {
        let flow = self.get_flow(api_key, flow_id).await?;

        let bucket_uuid = flow.team.bucket_uuid;
        debug!(flow = %flow_id, bucket = %bucket_uuid, team = %flow.team.slug, "Flow resolved to bucket");

        let clusters = self.list_clusters(&bucket_uuid).await?;

        Ok((bucket_uuid, clusters))
    }
}

#[async_trait]
impl ClusterInfoProvider for ClusterInfo {
    async fn resolve(
        &self,
        api_key: &str,
        flow_id: &str,
        cluster_id: &str,
    ) -> Result<ClusterRecord, ClusterInfoError> {
        let (bucket_uuid, clusters) = self.fetch_bucket_clusters(api_key, flow_id).await?;
        let cluster = select_cluster(clusters, cluster_id);

        if cluster.is_empty() {
            warn!(flow = %flow_id, bucket = %bucket_uuid, cluster = %cluster_id, "No cluster matched, returning empty record");
        } else {
            info!(flow = %flow_id, bucket = %bucket_uuid, cluster = %cluster_id, "Resolved cluster");
        }

        Ok(cluster)
    }
}
