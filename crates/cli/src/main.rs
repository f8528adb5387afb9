//! Node group autoscaler CLI
//!
//! A command-line tool for inspecting a cluster's node groups and issuing
//! one-shot scale requests against the control plane API.

mod output;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scaler_lib::remote::{ControlPlaneClient, NodeGroupApi};
use uuid::Uuid;

/// Per-request timeout for CLI calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Node group autoscaler CLI
#[derive(Parser)]
#[command(name = "ngs")]
#[command(author, version, about = "CLI for the node group autoscaler", long_about = None)]
struct Cli {
    /// Control plane API URL
    #[arg(long, env = "SCALER_API_URL", default_value = scaler_lib::config::DEFAULT_API_URL)]
    api_url: String,

    /// Control plane API username
    #[arg(long, env = "SCALER_USERNAME")]
    username: String,

    /// Control plane API password
    #[arg(long, env = "SCALER_PASSWORD", hide_env_values = true)]
    password: String,

    /// UUID of the target cluster
    #[arg(long, env = "SCALER_CLUSTER_ID")]
    cluster_id: Uuid,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the cluster's node groups
    Groups,

    /// List the nodes of one node group
    Nodes {
        /// Node group name
        group: String,
    },

    /// Request a new node count for a group
    ///
    /// Returns as soon as the control plane accepts the request; the
    /// group converges in the background.
    Scale {
        /// Node group name
        group: String,

        /// Requested node count
        count: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = ControlPlaneClient::new(&cli.api_url, &cli.username, &cli.password)
        .context("failed to build control plane client")?;

    match cli.command {
        Commands::Groups => {
            let groups = client
                .list_node_groups(cli.cluster_id, REQUEST_TIMEOUT)
                .await
                .context("failed to list node groups")?;
            output::print_groups(&groups);
        }
        Commands::Nodes { group } => {
            let details = client
                .get_node_group_with_nodes(cli.cluster_id, &group, REQUEST_TIMEOUT)
                .await
                .with_context(|| format!("failed to fetch node group {group}"))?;
            output::print_nodes(&details);
        }
        Commands::Scale { group, count } => {
            if count < 0 {
                bail!("count must be non-negative, got {count}");
            }
            let details = client
                .modify_node_group(cli.cluster_id, &group, count, REQUEST_TIMEOUT)
                .await
                .with_context(|| format!("failed to scale node group {group}"))?;
            println!(
                "scale request accepted: {} -> {} ({})",
                group, details.count, details.state
            );
        }
    }

    Ok(())
}
