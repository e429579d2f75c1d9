// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Market Configuration & Constants
//!
//! Every magic number in the market lives here. If you're hardcoding a
//! commit amount somewhere else, you're doing it wrong.
//!
//! Compile-time constants define the rules of the game (preset commit
//! amounts, the upvote unit, the funding growth ratio). [`MarketConfig`]
//! holds the handful of values a node operator may reasonably tune at
//! startup.

// ---------------------------------------------------------------------------
// Lifecycle Rules
// ---------------------------------------------------------------------------

/// The only amounts a wallet may commit toward a token's funding target.
///
/// An allow-list rather than a range: it keeps griefing with dust commits
/// off the table and keeps funding sums free of long binary fractions.
pub const COMMIT_PRESETS: [f64; 5] = [0.2, 0.5, 1.0, 1.5, 2.0];

/// Supply added to a token by a single upvote.
pub const UPVOTE_SUPPLY_UNIT: f64 = 1.0;

/// Fraction of the initial supply the funding target prices in.
///
/// `funding_target = cost(supply -> supply * (1 + FUNDING_GROWTH_RATIO))`.
pub const FUNDING_GROWTH_RATIO: f64 = 0.5;

/// Tolerance used when matching a requested commit amount to a preset.
/// Presets arrive through JSON as decimal literals, so anything further
/// away than this is a different number.
pub const COMMIT_AMOUNT_TOLERANCE: f64 = 1e-9;

/// Relative tolerance for supply arithmetic on migrated trades.
///
/// A sell within this distance of the whole supply sells all of it, and a
/// remainder this small after a sell is zero. Scaled by `max(1, supply)`.
pub const SUPPLY_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Default size of the trending list.
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// Virtual balance a fresh market starts with.
pub const DEFAULT_INITIAL_BALANCE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 3001;

// ---------------------------------------------------------------------------
// MarketConfig
// ---------------------------------------------------------------------------

/// Tunable parameters for a [`Market`](crate::Market).
#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    /// Starting value of the shared virtual balance.
    pub initial_balance: f64,

    /// Number of tokens returned by the trending list when the caller does
    /// not ask for a specific limit.
    pub trending_limit: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            trending_limit: DEFAULT_TRENDING_LIMIT,
        }
    }
}

/// Returns `true` if `amount` is one of the [`COMMIT_PRESETS`].
pub fn is_commit_preset(amount: f64) -> bool {
    amount.is_finite()
        && COMMIT_PRESETS
            .iter()
            .any(|preset| (preset - amount).abs() < COMMIT_AMOUNT_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_positive_and_sorted() {
        assert!(COMMIT_PRESETS.iter().all(|p| *p > 0.0));
        assert!(COMMIT_PRESETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_every_preset_is_accepted() {
        for preset in COMMIT_PRESETS {
            assert!(is_commit_preset(preset), "{preset} should be a preset");
        }
    }

    #[test]
    fn test_off_list_amounts_rejected() {
        assert!(!is_commit_preset(0.0));
        assert!(!is_commit_preset(0.3));
        assert!(!is_commit_preset(-1.0));
        assert!(!is_commit_preset(2.5));
        assert!(!is_commit_preset(f64::NAN));
        assert!(!is_commit_preset(f64::INFINITY));
    }

    #[test]
    fn test_decimal_literals_match() {
        // What a JSON parser hands us for "0.2" must be the preset.
        let parsed: f64 = "0.2".parse().unwrap();
        assert!(is_commit_preset(parsed));
    }

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.initial_balance, DEFAULT_INITIAL_BALANCE);
        assert_eq!(config.trending_limit, 5);
        assert_ne!(DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT);
    }
}
