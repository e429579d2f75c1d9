// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Launchpad Node
//!
//! Entry point for the `launchpad-node` binary. Parses CLI arguments,
//! initializes logging and metrics, restores or creates the market, and
//! serves the HTTP/WS API until a shutdown signal arrives.
//!
//! Subcommands:
//!
//! - `run`     start the node
//! - `version` print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use launchpad_market::{Market, MarketConfig};

use cli::{Commands, LaunchpadCli, RunArgs};
use logging::LogFormat;
use metrics::MarketMetrics;

/// Buffered events per WebSocket subscriber before it starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LaunchpadCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API and metrics servers and blocks until shutdown.
async fn run_node(args: RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_LOG_FILTER, LogFormat::from(args.log_format));

    tracing::info!(
        host = %args.host,
        port = args.port,
        metrics_port = args.metrics_port,
        state_file = ?args.state_file,
        "starting launchpad-node"
    );

    let market = Arc::new(open_market(&args)?);

    let market_metrics =
        Arc::new(MarketMetrics::new().context("failed to register prometheus metrics")?);
    market_metrics.observe_market(market.token_count(), market.balance());

    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        market: Arc::clone(&market),
        event_tx,
        metrics: Arc::clone(&market_metrics),
        event_order: Arc::default(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.host, args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {api_addr}"))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&market_metrics));
    let metrics_addr = format!("{}:{}", args.host, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {metrics_addr}"))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "API server error");
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "metrics server error");
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    if let Some(path) = &args.state_file {
        market
            .save_snapshot(path)
            .with_context(|| format!("failed to save market state to {}", path.display()))?;
    }

    tracing::info!("launchpad-node stopped");
    Ok(())
}

/// Restores the market from `--state-file` when the file exists, otherwise
/// starts an empty one with the configured balance.
fn open_market(args: &RunArgs) -> Result<Market> {
    let config = MarketConfig {
        initial_balance: args.initial_balance,
        trending_limit: args.trending_limit,
    };

    match &args.state_file {
        Some(path) if path.exists() => Market::load_snapshot(config, path)
            .with_context(|| format!("failed to restore market state from {}", path.display())),
        _ => Market::new(config).context("invalid market configuration"),
    }
}

fn print_version() {
    println!("launchpad-node   {}", env!("CARGO_PKG_VERSION"));
    println!("launchpad-market {}", launchpad_market::VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// A handler that fails to install is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
