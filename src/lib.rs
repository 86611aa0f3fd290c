//! Cluster Resolver Library
//!
//! Resolves the address and credentials of a cluster for a flow, for use
//! by the kube proxy.
//!
//! ## Lookup chain
//!
//! 1. Flow directory (`GET /flows/{flow}`) with the caller's API key gives
//!    the owning team's bucket.
//! 2. Cluster directory (`GET /api/bucket/{bucket}/clusters`) with the
//!    master API key lists the bucket's clusters.
//! 3. The cluster whose identifier matches is returned.
//!
//! ## Example
//!
//! ```ignore
//! use cluster_resolver::{ClusterInfo, ClusterInfoProvider, ResolverConfig};
//!
//! let resolver = ClusterInfo::new(ResolverConfig::from_env())?;
//! let cluster = resolver.resolve(&api_key, "flow-uuid", "production").await?;
//! println!("{}", cluster.address);
//! ```

pub mod cluster;
pub mod config;
pub mod decoder;
pub mod error;
pub mod flow;
pub mod resolver;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cluster::{BucketClusterLookup, ClusterRecord};
pub use config::ResolverConfig;
pub use error::{ClusterInfoError, UpstreamError};
pub use flow::{FlowRecord, FlowResolver, TeamDescriptor};
pub use resolver::{ClusterInfo, ClusterInfoProvider};
pub use transport::{HttpFetch, RawResponse, ReqwestTransport, UpstreamRequest};
