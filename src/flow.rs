//! Flow Directory Client
//!
//! Looks up a flow with the caller's own API key and exposes the owning
//! team's bucket, the join key for the cluster lookup.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::decoder::{decode_json, null_as_default, read_body};
use crate::error::UpstreamError;
use crate::transport::{HttpFetch, UpstreamRequest};

/// A deployment flow as returned by the flow directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: TeamDescriptor,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub pipelines: serde_json::Value,
    #[serde(default)]
    pub repository: serde_json::Value,
    #[serde(default)]
    pub user: serde_json::Value,
}

impl FlowRecord {
    pub fn bucket_uuid(&self) -> &str {
        &self.team.bucket_uuid
    }
}

/// Team owning a flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bucket_uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Reads flows from the flow directory
pub struct FlowResolver {
    config: Arc<ResolverConfig>,
    transport: Arc<dyn HttpFetch>,
}

impl FlowResolver {
    pub fn new(config: Arc<ResolverConfig>, transport: Arc<dyn HttpFetch>) -> Self {
        Self { config, transport }
    }

    /// Fetch a flow, authenticated with the caller's API key
    pub async fn get_flow(&self, api_key: &str, flow_id: &str) -> Result<FlowRecord, UpstreamError> {
        let url = self.config.flow_url(flow_id)?;
        debug!(url = %url, "Fetching flow");

        let response = self
            .transport
            .fetch(UpstreamRequest::get(url.clone(), api_key))
            .await;

        let body = read_body(response).map_err(|e| {
            debug!(url = %url, error = %e, "Error during flow request");
            e
        })?;

        decode_json(&url, &body)
    }
}
