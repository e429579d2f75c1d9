// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Prometheus Metrics
//!
//! Counters and gauges for the launch market, registered in a dedicated
//! registry with the `launchpad` prefix and served as Prometheus text on the
//! metrics port.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metric handles for the market node.
#[derive(Clone)]
pub struct MarketMetrics {
    registry: Registry,
    pub tokens_created_total: IntCounter,
    pub commits_total: IntCounter,
    pub upvotes_total: IntCounter,
    pub migrations_total: IntCounter,
    /// Settled trades, labelled by `side` (`buy` / `sell`).
    pub trades_total: IntCounterVec,
    pub comments_total: IntCounter,
    /// Operations the market refused, labelled by error `kind`.
    pub rejected_operations_total: IntCounterVec,
    pub tokens: IntGauge,
    pub balance: Gauge,
    /// Wall time spent inside market operations, in seconds.
    pub operation_latency_seconds: Histogram,
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

impl MarketMetrics {
    /// Creates the registry and registers every metric.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("launchpad".into()), None)?;

        let tokens_created_total = register(
            &registry,
            IntCounter::new("tokens_created_total", "Tokens launched")?,
        )?;
        let commits_total = register(
            &registry,
            IntCounter::new("commits_total", "Accepted commits")?,
        )?;
        let upvotes_total = register(
            &registry,
            IntCounter::new("upvotes_total", "Accepted upvotes")?,
        )?;
        let migrations_total = register(
            &registry,
            IntCounter::new("migrations_total", "Tokens that crossed their funding target")?,
        )?;
        let trades_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("trades_total", "Settled trades on migrated tokens"),
                &["side"],
            )?,
        )?;
        let comments_total = register(
            &registry,
            IntCounter::new("comments_total", "Comments posted")?,
        )?;
        let rejected_operations_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("rejected_operations_total", "Operations refused by the market"),
                &["kind"],
            )?,
        )?;
        let tokens = register(
            &registry,
            IntGauge::new("tokens", "Tokens currently in the registry")?,
        )?;
        let balance = register(
            &registry,
            Gauge::new("balance", "Global virtual balance")?,
        )?;
        let operation_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "operation_latency_seconds",
                    "Time spent inside market operations",
                )
                .buckets(vec![
                    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
                ]),
            )?,
        )?;

        Ok(Self {
            registry,
            tokens_created_total,
            commits_total,
            upvotes_total,
            migrations_total,
            trades_total,
            comments_total,
            rejected_operations_total,
            tokens,
            balance,
            operation_latency_seconds,
        })
    }

    /// Sets the gauges from the market's current figures.
    pub fn observe_market(&self, token_count: usize, balance: f64) {
        self.tokens.set(i64::try_from(token_count).unwrap_or(i64::MAX));
        self.balance.set(balance);
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<MarketMetrics>;

/// `GET /metrics`
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_prefix() {
        let metrics = MarketMetrics::new().unwrap();
        metrics.tokens_created_total.inc();
        metrics.trades_total.with_label_values(&["buy"]).inc();
        metrics.observe_market(3, 42.5);

        let text = metrics.encode().unwrap();
        assert!(text.contains("launchpad_tokens_created_total 1"));
        assert!(text.contains("launchpad_trades_total{side=\"buy\"} 1"));
        assert!(text.contains("launchpad_tokens 3"));
        assert!(text.contains("launchpad_balance 42.5"));
    }

    #[test]
    fn rejections_are_labelled_by_kind() {
        let metrics = MarketMetrics::new().unwrap();
        metrics
            .rejected_operations_total
            .with_label_values(&["ALREADY_COMMITTED"])
            .inc_by(2);
        let text = metrics.encode().unwrap();
        assert!(text.contains("launchpad_rejected_operations_total{kind=\"ALREADY_COMMITTED\"} 2"));
    }
}
