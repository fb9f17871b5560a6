//! Sample server (riffle-sv) - Main entry point
//!
//! Serves the sample audition HTTP API: random selection from the library
//! directory, sample delivery, and archiving to cloud storage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use riffle_sv::archive::{ArchiveService, DriveStore};
use riffle_sv::library::SampleLibrary;
use riffle_sv::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for riffle-sv
#[derive(Parser, Debug)]
#[command(name = "riffle-sv")]
#[command(about = "Sample server for Riffle")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5760", env = "RIFFLE_SV_PORT")]
    port: u16,

    /// Directory containing the sample library
    #[arg(short, long, env = "RIFFLE_LIBRARY_ROOT")]
    library_root: Option<PathBuf>,

    /// Destination folder name in cloud storage
    #[arg(long, env = "RIFFLE_ARCHIVE_FOLDER")]
    archive_folder: Option<String>,

    /// Bearer token required on /api routes (unset disables the gate)
    #[arg(long, env = "RIFFLE_API_TOKEN")]
    api_token: Option<String>,

    /// Cloud storage access token (unset disables archiving)
    #[arg(long, env = "RIFFLE_DRIVE_TOKEN")]
    drive_token: Option<String>,
}

/// Destination folder used when neither flag nor config file names one
const DEFAULT_ARCHIVE_FOLDER: &str = "sample saves";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riffle_sv=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Riffle sample server v{}", env!("CARGO_PKG_VERSION"));

    // clap already consumed the CLI flag and env var; the resolver adds the
    // config-file and compiled-default tiers.
    let library_root = match args.library_root {
        Some(root) => root,
        None => riffle_common::config::resolve_library_root(None, "RIFFLE_LIBRARY_ROOT")
            .context("Failed to resolve library root")?,
    };
    info!("Library root: {}", library_root.display());

    let archive_folder = match args.archive_folder {
        Some(folder) => folder,
        None => riffle_common::config::TomlConfig::load()
            .context("Failed to load config file")?
            .archive_folder
            .unwrap_or_else(|| DEFAULT_ARCHIVE_FOLDER.to_string()),
    };

    let library = Arc::new(SampleLibrary::new(library_root));

    let archive = match args.drive_token {
        Some(token) => {
            let store = DriveStore::new(token).context("Failed to create Drive client")?;
            info!("Archive destination: {:?}", archive_folder);
            Some(Arc::new(ArchiveService::new(Arc::new(store), archive_folder)))
        }
        None => {
            warn!("No cloud storage token configured; archiving is disabled");
            None
        }
    };

    if args.api_token.is_none() {
        info!("API authentication disabled (no token configured)");
    }

    let state = AppState::new(library, archive, args.api_token);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
