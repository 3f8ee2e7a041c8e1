//! refsync - directory synchronization with cross-file delta encoding
//!
//! Watches a source directory and uploads every new file to a destination
//! directory, sending only bytes that no previously synchronized file
//! already contains.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use refsync_client::{SyncClient, SyncConfig};
use refsync_store::{ByteRangeStore, DirectTransport};
use refsync_types::TransferStats;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// refsync - directory synchronization with cross-file delta encoding
#[derive(Parser)]
#[command(
    name = "refsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Directory synchronization with cross-file delta encoding",
    long_about = "refsync watches a source directory and uploads every new file to a\n\
                  destination, delta-encoded against previously synchronized files so\n\
                  duplicated content is copied in place instead of transferred again."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a source directory and synchronize new files as they appear
    Watch {
        /// Source directory to watch
        source: PathBuf,
        /// Destination directory files are reconstructed into
        destination: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,
        /// Minimum match length for delta encoding, in bytes
        #[arg(long, default_value = "32")]
        min_match_len: usize,
    },
    /// Run a single discovery pass and exit
    Sync {
        /// Source directory to scan
        source: PathBuf,
        /// Destination directory files are reconstructed into
        destination: PathBuf,
        /// Minimum match length for delta encoding, in bytes
        #[arg(long, default_value = "32")]
        min_match_len: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.quiet);

    info!("refsync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Watch {
            source,
            destination,
            interval_ms,
            min_match_len,
        } => {
            let config = SyncConfig {
                min_match_len,
                poll_interval: Duration::from_millis(interval_ms),
            };
            watch_command(source, destination, config, cli.quiet).await?;
        }
        Commands::Sync {
            source,
            destination,
            min_match_len,
        } => {
            let config = SyncConfig {
                min_match_len,
                ..Default::default()
            };
            sync_command(source, destination, config, cli.quiet).await?;
        }
    }

    Ok(())
}

fn init_logging(debug: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap();

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

async fn build_client(
    source: PathBuf,
    destination: PathBuf,
    config: SyncConfig,
) -> Result<SyncClient> {
    let store = Arc::new(ByteRangeStore::open(destination).await?);
    let transport = Arc::new(DirectTransport::new(store));
    Ok(SyncClient::with_config(source, transport, config)?)
}

async fn watch_command(
    source: PathBuf,
    destination: PathBuf,
    config: SyncConfig,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        println!(
            "{} Watching {} -> {}",
            style("⟲").blue().bold(),
            style(source.display()).cyan(),
            style(destination.display()).cyan()
        );
    }

    let mut client = build_client(source, destination, config).await?;
    client.run().await?;
    Ok(())
}

async fn sync_command(
    source: PathBuf,
    destination: PathBuf,
    config: SyncConfig,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        println!(
            "{} Synchronizing {} -> {}",
            style("→").green().bold(),
            style(source.display()).cyan(),
            style(destination.display()).cyan()
        );
    }

    let pb = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message("Synchronizing new files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let mut client = build_client(source, destination, config).await?;
    let stats = client.check().await?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    if !quiet {
        print_transfer_stats(&stats);
    }

    info!("sync pass completed");
    Ok(())
}

fn print_transfer_stats(stats: &TransferStats) {
    println!();
    println!("{}", style("Synchronization summary").bold());
    println!("  Files synchronized: {}", stats.files_synced);
    if stats.files_failed > 0 {
        println!(
            "  Files failed:       {}",
            style(stats.files_failed).red().bold()
        );
    }
    println!("  Literal bytes sent: {}", stats.literal_bytes);
    println!("  Bytes deduplicated: {}", stats.copied_bytes);
    println!(
        "  Transfer saved:     {}",
        style(format!("{:.1}%", stats.savings_ratio() * 100.0)).green()
    );
}
