//! Session engine (riffle-se) - demo shell
//!
//! Line-driven development frontend for the session engine. Each command is
//! translated into a synthetic pointer gesture and fed through the same
//! adapter a real frontend would use:
//!
//! - `n` swipe left (next sample)
//! - `s` swipe right (save, then next)
//! - `t` or empty line: tap (start / restart / toggle off)
//! - `q` quit

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use riffle_se::audio::mock::MockSink;
use riffle_se::audio::output::CpalSink;
use riffle_se::audio::AudioSink;
use riffle_se::client::{HttpSampleSource, SampleSource};
use riffle_se::gesture::{DeviceClass, PointerEvent};
use riffle_se::session::controller::{SessionController, SessionHandle};
use riffle_se::session::DEFAULT_MAX_LOOPS;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for riffle-se
#[derive(Parser, Debug)]
#[command(name = "riffle-se")]
#[command(about = "Session engine for Riffle")]
#[command(version)]
struct Args {
    /// Base URL of the sample server
    #[arg(
        short,
        long,
        default_value = "http://localhost:5760",
        env = "RIFFLE_SERVER_URL"
    )]
    server_url: String,

    /// Bearer token presented to the server
    #[arg(long, env = "RIFFLE_API_TOKEN")]
    token: Option<String>,

    /// Number of bounded-loop passes per sample
    #[arg(long, default_value_t = DEFAULT_MAX_LOOPS)]
    max_loops: u32,

    /// Input device class: touch or pointer
    #[arg(long, default_value = "pointer")]
    device: DeviceClass,

    /// Use the silent mock sink instead of the system audio device
    #[arg(long)]
    no_audio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riffle_se=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Riffle session engine v{}", env!("CARGO_PKG_VERSION"));
    info!("Sample server: {}", args.server_url);

    let source = Arc::new(
        HttpSampleSource::new(&args.server_url, args.token.clone())
            .context("Failed to create server client")?,
    );

    // The session is gated on authentication
    let authenticated = source
        .auth_status()
        .await
        .context("Failed to reach the sample server")?;
    if !authenticated {
        bail!("Server rejected the credential; sign in and pass --token");
    }

    let sink: Arc<dyn AudioSink> = if args.no_audio {
        Arc::new(MockSink::new())
    } else {
        match CpalSink::new() {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                warn!("Audio device unavailable ({}); running silent", e);
                Arc::new(MockSink::new())
            }
        }
    };

    let (controller, handle) =
        SessionController::new(sink, source, args.device, args.max_loops);
    let loop_task = tokio::spawn(controller.run());

    println!("Commands: n = next, s = save, t/<enter> = start/restart/toggle, q = quit");
    read_commands(&handle).await?;

    handle.shutdown();
    loop_task.await.context("Session loop panicked")?;
    Ok(())
}

/// Translate stdin commands into synthetic gestures.
async fn read_commands(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let gesture: &[PointerEvent] = match line.trim() {
            "n" => &[
                PointerEvent::Down { x: 300.0, y: 100.0 },
                PointerEvent::Move { x: 200.0, y: 100.0 },
                PointerEvent::Up { x: 100.0, y: 100.0 },
            ],
            "s" => &[
                PointerEvent::Down { x: 100.0, y: 100.0 },
                PointerEvent::Move { x: 200.0, y: 100.0 },
                PointerEvent::Up { x: 300.0, y: 100.0 },
            ],
            "" | "t" => &[
                PointerEvent::Down { x: 100.0, y: 100.0 },
                PointerEvent::Up { x: 102.0, y: 100.0 },
            ],
            "q" => break,
            other => {
                println!("Unknown command: {other}");
                continue;
            }
        };

        for event in gesture {
            if !handle.pointer(*event) {
                bail!("Session loop is gone");
            }
        }
    }

    Ok(())
}
