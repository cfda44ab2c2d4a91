mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hwc")]
#[command(about = "Drive HuaweiCloud MRS cluster operations to completion", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// MapReduce Service cluster operations
    #[command(subcommand)]
    Mrs(MrsCommands),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum MrsCommands {
    /// Show the current state of a cluster
    Show {
        #[arg(short, long)]
        cluster: String,
    },
    /// Create a cluster from a JSON request body
    Create {
        /// Path to the cluster creation body
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Resize one node group
    Resize {
        #[arg(short, long)]
        cluster: String,
        /// Node group name (e.g. core_node_analysis_group)
        #[arg(short, long)]
        group: String,
        /// Current node count; omit for a group without nodes
        #[arg(long)]
        current: Option<u32>,
        /// Desired node count
        #[arg(long)]
        desired: u32,
        /// Node flavor, required when populating an empty group
        #[arg(long)]
        flavor: Option<String>,
        #[arg(long, default_value = "SAS")]
        data_volume_type: String,
        #[arg(long, default_value_t = 600)]
        data_volume_size: u32,
        #[arg(long, default_value_t = 1)]
        data_volume_count: u32,
    },
    /// Apply the node group changes between two node layouts
    UpdateNodes {
        #[arg(short, long)]
        cluster: String,
        /// Cluster type (ANALYSIS, STREAMING, MIXED, CUSTOM)
        #[arg(short = 't', long = "type")]
        cluster_type: String,
        /// Current node layout (JSON)
        #[arg(long)]
        from: PathBuf,
        /// Desired node layout (JSON)
        #[arg(long)]
        to: PathBuf,
        /// Only print the planned resizes
        #[arg(long)]
        dry_run: bool,
    },
    /// Install additional components
    AddComponents {
        #[arg(short, long)]
        cluster: String,
        /// Component name; repeat for several components
        #[arg(long = "component", required = true)]
        components: Vec<String>,
    },
    /// Delete a cluster (unsubscribe when prepaid)
    Delete {
        #[arg(short, long)]
        cluster: String,
        /// The cluster is billed yearly/monthly
        #[arg(long)]
        prepaid: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("hwc {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Mrs(command) => commands::mrs::handle(command).await?,
    }

    Ok(())
}
