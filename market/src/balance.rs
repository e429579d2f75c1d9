// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Global Virtual Balance
//!
//! The single shared balance that migrated buys draw from and migrated
//! sells pay into. It models the acting user's funds, not a ledger of
//! accounts.
//!
//! [`VirtualBalance`] enforces the one rule that matters: a debit never
//! takes the balance below zero. Thread safety is handled at the
//! [`Market`](crate::Market) level, which keeps the balance behind a
//! `Mutex` and only touches it while holding the traded token's lock.

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// A non-negative virtual balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualBalance(f64);

impl VirtualBalance {
    /// Creates a balance holding `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidAmount`] if `amount` is negative or not
    /// finite.
    pub fn new(amount: f64) -> Result<Self, MarketError> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(MarketError::InvalidAmount {
                amount,
                reason: "balance must be a non-negative finite number",
            });
        }
        Ok(Self(amount))
    }

    /// Current amount.
    pub fn amount(&self) -> f64 {
        self.0
    }

    /// Checks that `amount` can be debited, without debiting it.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InsufficientBalance`] if the balance is short.
    pub fn ensure_covers(&self, amount: f64) -> Result<(), MarketError> {
        if self.0 < amount {
            return Err(MarketError::InsufficientBalance {
                required: amount,
                available: self.0,
            });
        }
        Ok(())
    }

    /// Subtracts `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InsufficientBalance`] if the balance is short;
    /// the balance is left untouched.
    pub fn debit(&mut self, amount: f64) -> Result<f64, MarketError> {
        self.ensure_covers(amount)?;
        // Subtraction of a covered amount can still round to a hair below
        // zero; clamp so the invariant holds exactly.
        self.0 = (self.0 - amount).max(0.0);
        Ok(self.0)
    }

    /// Adds `amount` and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Internal`] if the result would not be finite.
    pub fn credit(&mut self, amount: f64) -> Result<f64, MarketError> {
        let next = self.0 + amount;
        if !next.is_finite() {
            return Err(MarketError::Internal("balance overflow".into()));
        }
        self.0 = next;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_negative_and_non_finite() {
        assert!(VirtualBalance::new(0.0).is_ok());
        assert!(VirtualBalance::new(-0.01).is_err());
        assert!(VirtualBalance::new(f64::NAN).is_err());
        assert!(VirtualBalance::new(f64::INFINITY).is_err());
    }

    #[test]
    fn debit_and_credit() {
        let mut balance = VirtualBalance::new(10.0).unwrap();
        assert_eq!(balance.debit(4.0).unwrap(), 6.0);
        assert_eq!(balance.credit(1.5).unwrap(), 7.5);
        assert_eq!(balance.amount(), 7.5);
    }

    #[test]
    fn overdraft_rejected_without_change() {
        let mut balance = VirtualBalance::new(1.0).unwrap();
        let err = balance.debit(1.5).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientBalance { .. }));
        assert_eq!(balance.amount(), 1.0);
    }

    #[test]
    fn debit_of_exact_balance_reaches_zero() {
        let mut balance = VirtualBalance::new(0.3).unwrap();
        assert_eq!(balance.debit(0.3).unwrap(), 0.0);
    }

    #[test]
    fn credit_overflow_is_internal() {
        let mut balance = VirtualBalance::new(f64::MAX).unwrap();
        assert!(balance.credit(f64::MAX).unwrap_err().kind().is_internal());
        assert_eq!(balance.amount(), f64::MAX);
    }
}
