// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Bonding Curve Math
//!
//! Every token is priced by a power-law curve:
//!
//! ```text
//! price(x) = A · x^B            A > 0, B > 0
//! ```
//!
//! The cost of moving supply from `s` to `s + n` is the definite integral of
//! the price over that interval:
//!
//! ```text
//! cost(s, n) = A · ((s + n)^(B+1) - s^(B+1)) / (B + 1)
//! ```
//!
//! The same integral prices three things:
//!
//! - **buy**: `cost(supply, amount)`
//! - **sell refund**: `cost(supply - amount, amount)`, the same interval
//!   integrated from its lower bound, so a buy followed by a sell of the same
//!   amount nets to zero
//! - **funding target**: `cost(s0, 0.5 · s0)`, the price of growing the
//!   initial supply by half
//!
//! A fresh token has `s0 = 0`, so its funding target is `0` and the first
//! commit migrates it. That is the formula, not a bug in this module.
//!
//! Everything here is pure. Supply is kept non-negative by the lifecycle
//! engine; a negative base raised to a fractional exponent would be `NaN`,
//! so these functions treat one as an internal fault instead of computing it.

use serde::{Deserialize, Serialize};

use crate::config::FUNDING_GROWTH_RATIO;
use crate::error::MarketError;

/// Validated curve parameters for a single token.
///
/// Fixed at token creation and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Price coefficient `A`.
    pub a: f64,
    /// Price exponent `B`.
    pub b: f64,
}

impl CurveParams {
    /// Validates and wraps a pair of curve parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidCurveParams`] unless both values are
    /// finite and strictly positive.
    pub fn new(a: f64, b: f64) -> Result<Self, MarketError> {
        if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
            return Err(MarketError::InvalidCurveParams { a, b });
        }
        Ok(Self { a, b })
    }

    /// Cost of growing supply from `supply` by `amount`.
    pub fn cost(&self, supply: f64, amount: f64) -> Result<f64, MarketError> {
        cumulative_cost(self.a, self.b, supply, amount)
    }

    /// Funding target for a token whose supply starts at `initial_supply`.
    pub fn funding_target(&self, initial_supply: f64) -> Result<f64, MarketError> {
        funding_target(self.a, self.b, initial_supply)
    }

    /// Marginal price at `supply`.
    pub fn spot_price(&self, supply: f64) -> Result<f64, MarketError> {
        spot_price(self.a, self.b, supply)
    }
}

/// Definite integral of `A·x^B` from `supply` to `supply + amount`.
///
/// # Errors
///
/// - [`MarketError::InvalidCurveParams`] if `A` or `B` is non-finite or
///   `B ≤ -1` (the antiderivative would divide by zero or flip sign).
/// - [`MarketError::Internal`] if `supply` or `amount` is negative or
///   non-finite, or the result is not a finite number.
pub fn cumulative_cost(a: f64, b: f64, supply: f64, amount: f64) -> Result<f64, MarketError> {
    if !a.is_finite() || !b.is_finite() || b <= -1.0 {
        return Err(MarketError::InvalidCurveParams { a, b });
    }
    ensure_domain("supply", supply)?;
    ensure_domain("amount", amount)?;

    let exponent = b + 1.0;
    let upper = (supply + amount).powf(exponent);
    let lower = supply.powf(exponent);
    finite("cumulative cost", a * (upper - lower) / exponent)
}

/// Collective funding a token must reach before it migrates.
///
/// Equal to the cost of growing `initial_supply` by
/// [`FUNDING_GROWTH_RATIO`]. Zero when `initial_supply` is zero.
pub fn funding_target(a: f64, b: f64, initial_supply: f64) -> Result<f64, MarketError> {
    cumulative_cost(a, b, initial_supply, FUNDING_GROWTH_RATIO * initial_supply)
}

/// Marginal price `A·supply^B`.
pub fn spot_price(a: f64, b: f64, supply: f64) -> Result<f64, MarketError> {
    if !a.is_finite() || !b.is_finite() {
        return Err(MarketError::InvalidCurveParams { a, b });
    }
    ensure_domain("supply", supply)?;
    finite("spot price", a * supply.powf(b))
}

fn ensure_domain(name: &str, value: f64) -> Result<(), MarketError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MarketError::Internal(format!(
            "{name} {value} is outside the curve domain"
        )))
    }
}

fn finite(what: &str, value: f64) -> Result<f64, MarketError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MarketError::Internal(format!("{what} is not finite")))
    }
}
