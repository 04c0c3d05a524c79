//! anomaly-engine - replay a recorded detection stream through the engine
//!
//! Reads JSONL detection frames, feeds them to one engine instance in order,
//! and emits anomaly events to stdout or a JSONL file.
//!
//! Module structure:
//! - `domain/` - Core types (Detection, Track, AnomalyEvent, errors)
//! - `services/` - Engine logic (association, classifiers, facade)
//! - `infra/` - Infrastructure (Config, Metrics)
//! - `io/` - Replay input and event egress

use anomaly_engine::infra::Config;
use anomaly_engine::io::{Egress, FrameReader};
use anomaly_engine::services::Engine;
use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Replay a JSONL detection stream through the anomaly detection engine
#[derive(Parser, Debug)]
#[command(name = "anomaly-engine", version, about)]
struct Args {
    /// JSONL file of detection frames
    input: String,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Write events to this JSONL file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Video width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Source frame rate
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

fn main() -> anyhow::Result<()> {
    // Structured logging, level configurable via RUST_LOG (default: INFO)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "anomaly-engine starting");

    let args = Args::parse();

    let config = Config::load_from_path(&args.config);
    info!(
        config_file = %config.config_file(),
        loitering_secs = %config.loitering_secs(),
        abandoned_object_secs = %config.abandoned_object_secs(),
        movement_px = %config.movement_px(),
        track_staleness_secs = %config.track_staleness_secs(),
        monitoring_zones = %config.monitoring_zones().len(),
        "config_loaded"
    );

    let egress = args.output.as_deref().map(Egress::new);

    let mut engine = Engine::new(config).context("Engine construction failed")?;
    engine.initialize(args.width, args.height, args.fps);

    let mut emitted = 0usize;
    for frame in FrameReader::open(&args.input)? {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                // A bad record degrades to a skipped frame, never a crash
                warn!(error = %format!("{:#}", e), "frame_skipped");
                continue;
            }
        };

        let events = engine.detect_anomalies(&frame.detections, frame.frame_number, frame.timestamp);
        emitted += events.len();

        match &egress {
            Some(egress) => {
                egress.write_events(&events);
            }
            None => {
                for event in &events {
                    println!("{}", serde_json::to_string(event)?);
                }
            }
        }
    }

    info!(events = %emitted, active_tracks = %engine.active_tracks(), "replay_complete");
    engine.metrics().report();

    Ok(())
}
