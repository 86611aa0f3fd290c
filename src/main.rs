//! Cluster Resolver CLI
//!
//! Resolves a flow's cluster the same way the kube proxy does, for
//! debugging access problems from a shell.
//!
//! # Usage
//! ```bash
//! # Resolve a cluster (password redacted unless --show-password)
//! cluster-resolver resolve --api-key $CP_API_KEY --flow 0d1c... --cluster production
//!
//! # Show the team behind a flow
//! cluster-resolver flow --api-key $CP_API_KEY --flow 0d1c...
//!
//! # List the clusters in a bucket (uses the master key)
//! cluster-resolver clusters --bucket 7a2e...
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cluster_resolver::config::{
    ENV_CLUSTER_HOST, ENV_FLOW_HOST, ENV_MASTER_API_KEY, ENV_SCHEME, ENV_TIMEOUT_SECS,
};
use cluster_resolver::{ClusterInfo, ClusterInfoProvider, ClusterRecord, ResolverConfig};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "cluster-resolver")]
#[command(about = "Resolve cluster address and credentials for a flow", long_about = None)]
#[command(version)]
struct Cli {
    /// Flow directory host
    #[arg(long, env = ENV_FLOW_HOST, default_value = "")]
    flow_host: String,

    /// Cluster directory host
    #[arg(long, env = ENV_CLUSTER_HOST, default_value = "")]
    cluster_host: String,

    /// Master API key for the cluster directory
    #[arg(long, env = ENV_MASTER_API_KEY, default_value = "", hide_env_values = true)]
    master_api_key: String,

    /// Upstream URL scheme
    #[arg(long, env = ENV_SCHEME, default_value = "https")]
    scheme: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, default_value = "30")]
    timeout: u64,

    /// Enable verbose logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a cluster for a flow
    Resolve {
        /// Caller's API key
        #[arg(long, env = "CP_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Flow UUID
        #[arg(long)]
        flow: String,

        /// Cluster identifier
        #[arg(long)]
        cluster: String,

        /// Fail when no cluster matches instead of printing an empty record
        #[arg(long)]
        strict: bool,

        /// Print the cluster password in cleartext
        #[arg(long)]
        show_password: bool,
    },

    /// Show the flow's owning team
    Flow {
        /// Caller's API key
        #[arg(long, env = "CP_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Flow UUID
        #[arg(long)]
        flow: String,
    },

    /// List the clusters registered under a bucket
    Clusters {
        /// Bucket UUID
        #[arg(long)]
        bucket: String,
    },
}

/// Listing row for the `clusters` command; no credentials
#[derive(Serialize)]
struct ClusterSummary<'a> {
    identifier: &'a str,
    address: &'a str,
    #[serde(rename = "type")]
    cluster_type: &'a str,
}

impl<'a> From<&'a ClusterRecord> for ClusterSummary<'a> {
    fn from(cluster: &'a ClusterRecord) -> Self {
        Self {
            identifier: &cluster.identifier,
            address: &cluster.address,
            cluster_type: &cluster.cluster_type,
        }
    }
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = ResolverConfig::new(cli.flow_host, cli.cluster_host, cli.master_api_key)
        .with_scheme(cli.scheme)
        .with_timeout(Duration::from_secs(cli.timeout));
    info!(flow_host = %config.flow_host, cluster_host = %config.cluster_host, "Cluster resolver starting");

    let resolver = ClusterInfo::new(config).context("Failed to initialise resolver")?;

    match cli.command {
        Commands::Resolve {
            api_key,
            flow,
            cluster,
            strict,
            show_password,
        } => {
            let record = if strict {
                resolver.resolve_strict(&api_key, &flow, &cluster).await
            } else {
                resolver.resolve(&api_key, &flow, &cluster).await
            }
            .with_context(|| format!("Failed to resolve cluster {} for flow {}", cluster, flow))?;

            let record = if show_password { record } else { record.redacted() };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Flow { api_key, flow } => {
            let record = resolver
                .get_flow(&api_key, &flow)
                .await
                .with_context(|| format!("Failed to get flow {}", flow))?;

            println!("{}", serde_json::to_string_pretty(&record.team)?);
        }

        Commands::Clusters { bucket } => {
            let clusters = resolver
                .list_clusters(&bucket)
                .await
                .with_context(|| format!("Failed to list clusters for bucket {}", bucket))?;
            let summaries: Vec<ClusterSummary<'_>> =
                clusters.iter().map(ClusterSummary::from).collect();

            info!("Listed {} clusters", summaries.len());
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    Ok(())
}
