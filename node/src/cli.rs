// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CLI Interface
//!
//! Defines the command-line argument structure for `launchpad-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use launchpad_market::config::{
    DEFAULT_HTTP_PORT, DEFAULT_INITIAL_BALANCE, DEFAULT_METRICS_PORT, DEFAULT_TRENDING_LIMIT,
};

use crate::logging::LogFormat;

/// Launchpad token launch market node.
///
/// Serves the market over a JSON REST API, streams market events over a
/// WebSocket, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "launchpad-node",
    about = "Launchpad token launch market node",
    version,
    propagate_version = true
)]
pub struct LaunchpadCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the market node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Log output format as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Interface to bind the API and metrics listeners on.
    #[arg(long, env = "LAUNCHPAD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the REST and WebSocket API.
    #[arg(long, short = 'p', env = "LAUNCHPAD_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "LAUNCHPAD_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Virtual balance a fresh market starts with.
    ///
    /// Ignored when the market is restored from a state file.
    #[arg(long, env = "LAUNCHPAD_INITIAL_BALANCE", default_value_t = DEFAULT_INITIAL_BALANCE)]
    pub initial_balance: f64,

    /// Default size of the trending list.
    #[arg(long, env = "LAUNCHPAD_TRENDING_LIMIT", default_value_t = DEFAULT_TRENDING_LIMIT)]
    pub trending_limit: usize,

    /// JSON file the market is restored from on start and saved to on
    /// shutdown. When omitted, state lives only as long as the process.
    #[arg(long, short = 's', env = "LAUNCHPAD_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}
