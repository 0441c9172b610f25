//! Olivetum consensus node entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod node;

use config::NodeConfig;
use node::Node;

/// Olivetum consensus engine node.
#[derive(Parser, Debug)]
#[command(name = "olivetum-node")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "olivetum-node.toml")]
    config: PathBuf,

    /// Data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// API bind address
    #[arg(long)]
    api_bind: Option<String>,

    /// Number of sealing threads (0 = auto-detect, negative disables)
    #[arg(long)]
    seal_threads: Option<i64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = args
        .log_level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = NodeConfig::load_or_default(&args.config)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(api_bind) = args.api_bind {
        config.api.bind_address = api_bind;
    }
    if let Some(threads) = args.seal_threads {
        config.sealing.threads = threads;
    }

    info!(
        data_dir = %config.data_dir.display(),
        api = %config.api.bind_address,
        "starting olivetum node"
    );

    let node = Node::new(config)?;
    node.run().await
}
