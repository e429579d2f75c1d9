// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Market Snapshots
//!
//! The market lives in memory. Snapshots let a node survive a
//! restart anyway: [`Market::snapshot`] captures the balance and every
//! token, and [`Market::from_snapshot`] rebuilds a market from one.
//!
//! A snapshot read from disk is untrusted input. Restoring re-checks every
//! invariant the live market maintains (valid curves, non-negative supply
//! and funding, unique tickers) and refuses the whole file if any token
//! breaks one.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::VirtualBalance;
use crate::config::MarketConfig;
use crate::curve::CurveParams;
use crate::lifecycle::Market;
use crate::registry::Registry;
use crate::token::Token;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur while saving or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON for this format.
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot decoded but breaks a market invariant.
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Serializable state of a whole market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub version: u32,
    pub balance: f64,
    /// Tokens in creation order.
    pub tokens: Vec<Token>,
}

impl Market {
    /// Captures the balance and every token as one consistent state.
    ///
    /// Takes the registry read lock, then every token lock, then the
    /// balance, the same order trades use. Nothing can move between the
    /// token copies and the balance read.
    pub fn snapshot(&self) -> MarketSnapshot {
        let registry = self.registry().read();
        let guards = registry.lock_all();
        let balance = self.balance();
        let tokens = guards.iter().map(|token| Token::clone(token)).collect();
        MarketSnapshot {
            version: SNAPSHOT_VERSION,
            balance,
            tokens,
        }
    }

    /// Rebuilds a market from a snapshot.
    ///
    /// `config.initial_balance` is ignored; the balance comes from the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Invalid`] if the version is unknown or any
    /// token or the balance breaks a market invariant.
    pub fn from_snapshot(
        config: MarketConfig,
        snapshot: MarketSnapshot,
    ) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Invalid(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        let balance = VirtualBalance::new(snapshot.balance)
            .map_err(|e| SnapshotError::Invalid(e.to_string()))?;

        let mut registry = Registry::new();
        for token in snapshot.tokens {
            validate_token(&token)?;
            registry
                .insert(token)
                .map_err(|e| SnapshotError::Invalid(e.to_string()))?;
        }

        tracing::info!(
            tokens = registry.len(),
            balance = balance.amount(),
            "market restored from snapshot"
        );
        Ok(Market::from_parts(config, registry, balance))
    }

    /// Writes a snapshot to `path` as pretty-printed JSON.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let snapshot = self.snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::info!(
            path = %path.display(),
            tokens = snapshot.tokens.len(),
            "market snapshot saved"
        );
        Ok(())
    }

    /// Reads a snapshot from `path` and rebuilds a market from it.
    pub fn load_snapshot(
        config: MarketConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, SnapshotError> {
        let bytes = std::fs::read(path.as_ref())?;
        let snapshot: MarketSnapshot = serde_json::from_slice(&bytes)?;
        Market::from_snapshot(config, snapshot)
    }
}

fn validate_token(token: &Token) -> Result<(), SnapshotError> {
    let invalid = |what: &str| {
        SnapshotError::Invalid(format!("token {} ({}): {what}", token.id, token.ticker))
    };

    if token.id.trim().is_empty() {
        return Err(invalid("empty id"));
    }
    if token.ticker.trim().is_empty() || token.ticker != token.ticker.to_uppercase() {
        return Err(invalid("ticker must be non-empty uppercase"));
    }
    CurveParams::new(token.curve.a, token.curve.b).map_err(|e| invalid(&e.to_string()))?;

    let non_negative = |v: f64| v.is_finite() && v >= 0.0;
    if !non_negative(token.supply) {
        return Err(invalid("supply must be a non-negative finite number"));
    }
    if !non_negative(token.collective_funding) {
        return Err(invalid("collective funding must be a non-negative finite number"));
    }
    if !non_negative(token.funding_target) {
        return Err(invalid("funding target must be a non-negative finite number"));
    }
    if token.migrated_at.is_some() && !token.migrated {
        return Err(invalid("migration timestamp on an unmigrated token"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::NewToken;

    fn populated() -> Market {
        let market = Market::new(MarketConfig::default()).unwrap();
        let a = market
            .create_token(NewToken::new("A", "AAA", "d", "i", 0.1, 2.0))
            .unwrap();
        market
            .create_token(NewToken::new("B", "BBB", "d", "i", 1.0, 1.0))
            .unwrap();
        market.commit(&a.id, "alice", 0.5).unwrap();
        market.upvote(&a.id, "bob").unwrap();
        market.upvote(&a.id, "carol").unwrap();
        market.buy_migrated(&a.id, "alice", 1.0).unwrap();
        market.add_comment(&a.id, "bob", "gm").unwrap();
        market
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let market = populated();
        let snapshot = market.snapshot();

        let restored = Market::from_snapshot(MarketConfig::default(), snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.balance(), market.balance());
        assert_eq!(restored.list_all(), market.list_all());
    }

    #[test]
    fn restored_market_keeps_enforcing_rules() {
        let market = populated();
        let restored = Market::from_snapshot(MarketConfig::default(), market.snapshot()).unwrap();
        let a = &restored.list_all()[0];

        assert!(restored.upvote(&a.id, "bob").is_err());
        assert!(restored.commit(&a.id, "alice", 1.0).is_err());
        assert!(restored
            .create_token(NewToken::new("X", "aaa", "d", "i", 1.0, 1.0))
            .is_err());
    }

    #[test]
    fn duplicate_ticker_in_snapshot_rejected() {
        let market = populated();
        let mut snapshot = market.snapshot();
        let mut clone = snapshot.tokens[0].clone();
        clone.id = "another-id".into();
        snapshot.tokens.push(clone);

        let err = Market::from_snapshot(MarketConfig::default(), snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::Invalid(_)));
    }

    #[test]
    fn negative_supply_in_snapshot_rejected() {
        let market = populated();
        let mut snapshot = market.snapshot();
        snapshot.tokens[1].supply = -2.0;
        assert!(Market::from_snapshot(MarketConfig::default(), snapshot).is_err());
    }

    #[test]
    fn unknown_version_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.version = 99;
        assert!(Market::from_snapshot(MarketConfig::default(), snapshot).is_err());
    }

    #[test]
    fn save_and_load_file() {
        let market = populated();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");

        market.save_snapshot(&path).unwrap();
        let loaded = Market::load_snapshot(MarketConfig::default(), &path).unwrap();
        assert_eq!(loaded.snapshot(), market.snapshot());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Market::load_snapshot(MarketConfig::default(), dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Io(_)));
    }
}
