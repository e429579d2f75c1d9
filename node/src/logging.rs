// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Structured Logging
//!
//! Sets up the global `tracing` subscriber for the node. Output goes to
//! stderr, either as colored human-readable lines or as JSON records, and is
//! filtered through `RUST_LOG` when it is set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is absent.
pub const DEFAULT_LOG_FILTER: &str = "launchpad_node=info,launchpad_market=info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-field output for a terminal.
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    /// Parses "json" or "pretty" in any case. Anything else is `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Builds the filter: `RUST_LOG` when it parses, `default_filter` otherwise.
fn build_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs the global subscriber. Must be called once, before any task
/// emits events.
///
/// ```text
/// RUST_LOG=launchpad_market=debug,launchpad_node=info launchpad-node run
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let filter = build_filter(default_filter);
    let writer = std::io::stderr;

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(false)
                    .with_target(true),
            )
            .init(),
    }

    tracing::debug!(?format, "tracing subscriber installed");
}
