//! Quill market-making engine - main entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quill_engine::config::EngineConfig;
use quill_engine::metrics::MetricsRegistry;
use quill_engine::pipeline::Pipeline;
use quill_engine::server::{start_metrics_server, EngineStatus, ServerState};

/// Quill market-making engine
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version = "0.1.0")]
#[command(about = "Low-latency market-making engine", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "quill.toml")]
    config: String,

    /// Number of ticks to process before shutting down
    #[arg(short, long, default_value = "100000")]
    ticks: u64,

    /// Metrics server port (overrides config)
    #[arg(short, long)]
    metrics_port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Starting Quill market-making engine v0.1.0");

    let config = if std::path::Path::new(&args.config).exists() {
        EngineConfig::load(&args.config)?
    } else {
        tracing::warn!("Config file not found, using simulation defaults");
        EngineConfig::simulation()
    };
    tracing::info!(name = %config.name, venues = config.venues.len(), "configuration loaded");

    let metrics = Arc::new(MetricsRegistry::new());
    let state = Arc::new(ServerState::new(metrics.clone()));

    let metrics_state = state.clone();
    let metrics_port = args.metrics_port.unwrap_or(config.metrics_port);
    tokio::spawn(async move {
        if let Err(e) = start_metrics_server(metrics_state, metrics_port).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    state.set_status(EngineStatus::Running).await;

    let ticks = args.ticks;
    let pipeline = Pipeline::new(config, metrics);
    let stats = tokio::task::spawn_blocking(move || pipeline.run_for_ticks(ticks)).await??;

    state.set_status(EngineStatus::Stopped).await;

    tracing::info!(
        ticks = stats.ticks_processed,
        routed = stats.orders_routed,
        fills = stats.fills_applied,
        pnl = stats.total_pnl,
        "pipeline finished"
    );
    tracing::info!("run summary: {}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
