// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Error types for the launch market.
//!
//! Every market operation that can fail returns a [`MarketError`]. The
//! variants split into two camps: validation and precondition failures the
//! caller can fix, and [`MarketError::Internal`], which means the market
//! itself hit something it should never see (a non-finite price, say).
//! [`ErrorKind`] gives each variant a stable code for transport layers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during market operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    /// A required creation or comment field is absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A token with this ticker already exists.
    #[error("duplicate ticker: a token with ticker '{0}' already exists")]
    DuplicateTicker(String),

    /// Curve parameters are not positive finite numbers.
    #[error("invalid curve parameters: a={a}, b={b} (both must be positive and finite)")]
    InvalidCurveParams {
        /// The rejected `A` coefficient.
        a: f64,
        /// The rejected `B` exponent.
        b: f64,
    },

    /// A commit amount outside the presets, or a non-positive trade amount.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount.
        amount: f64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The wallet identifier is absent or blank.
    #[error("missing wallet identifier")]
    MissingWallet,

    /// The token id does not resolve.
    #[error("token not found: {0}")]
    NotFound(String),

    /// The token exists but has not migrated, so it cannot be traded.
    #[error("token {0} has not migrated and cannot be traded")]
    NotMigrated(String),

    /// The wallet has already committed to this token.
    #[error("wallet {wallet} already committed to token {token_id}")]
    AlreadyCommitted {
        /// The token the wallet committed to.
        token_id: String,
        /// The repeat wallet.
        wallet: String,
    },

    /// The wallet has already upvoted this token.
    #[error("wallet {wallet} already upvoted token {token_id}")]
    AlreadyUpvoted {
        /// The token the wallet upvoted.
        token_id: String,
        /// The repeat wallet.
        wallet: String,
    },

    /// The global balance cannot cover the purchase.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Cost of the purchase.
        required: f64,
        /// Current global balance.
        available: f64,
    },

    /// The token's supply cannot cover the sale.
    #[error("insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply {
        /// Amount the caller tried to sell.
        requested: f64,
        /// Current token supply.
        available: f64,
    },

    /// The market hit a state it should never reach.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable, transport-friendly code for a [`MarketError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingField,
    DuplicateTicker,
    InvalidCurveParams,
    InvalidAmount,
    MissingWallet,
    NotFound,
    NotMigrated,
    AlreadyCommitted,
    AlreadyUpvoted,
    InsufficientBalance,
    InsufficientSupply,
    Internal,
}

impl ErrorKind {
    /// The code as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MISSING_FIELD",
            ErrorKind::DuplicateTicker => "DUPLICATE_TICKER",
            ErrorKind::InvalidCurveParams => "INVALID_CURVE_PARAMS",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::MissingWallet => "MISSING_WALLET",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NotMigrated => "NOT_MIGRATED",
            ErrorKind::AlreadyCommitted => "ALREADY_COMMITTED",
            ErrorKind::AlreadyUpvoted => "ALREADY_UPVOTED",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::InsufficientSupply => "INSUFFICIENT_SUPPLY",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// `true` for faults inside the market, `false` for anything the caller
    /// can fix by sending a different request.
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MarketError {
    /// Returns the stable code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::MissingField(_) => ErrorKind::MissingField,
            MarketError::DuplicateTicker(_) => ErrorKind::DuplicateTicker,
            MarketError::InvalidCurveParams { .. } => ErrorKind::InvalidCurveParams,
            MarketError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            MarketError::MissingWallet => ErrorKind::MissingWallet,
            MarketError::NotFound(_) => ErrorKind::NotFound,
            MarketError::NotMigrated(_) => ErrorKind::NotMigrated,
            MarketError::AlreadyCommitted { .. } => ErrorKind::AlreadyCommitted,
            MarketError::AlreadyUpvoted { .. } => ErrorKind::AlreadyUpvoted,
            MarketError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            MarketError::InsufficientSupply { .. } => ErrorKind::InsufficientSupply,
            MarketError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(MarketError::MissingWallet.kind(), ErrorKind::MissingWallet);
        assert_eq!(
            MarketError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MarketError::InsufficientSupply {
                requested: 2.0,
                available: 1.0
            }
            .kind(),
            ErrorKind::InsufficientSupply
        );
    }

    #[test]
    fn only_internal_is_internal() {
        assert!(ErrorKind::Internal.is_internal());
        assert!(!ErrorKind::NotFound.is_internal());
        assert!(!ErrorKind::InvalidAmount.is_internal());
    }

    #[test]
    fn kind_serializes_as_wire_code() {
        let json = serde_json::to_string(&ErrorKind::AlreadyCommitted).unwrap();
        assert_eq!(json, "\"ALREADY_COMMITTED\"");
        assert_eq!(ErrorKind::AlreadyCommitted.to_string(), "ALREADY_COMMITTED");
    }

    #[test]
    fn messages_are_descriptive() {
        let err = MarketError::DuplicateTicker("PEPE".into());
        assert!(err.to_string().contains("PEPE"));
        let err = MarketError::InsufficientBalance {
            required: 12.5,
            available: 3.0,
        };
        assert!(err.to_string().contains("12.5"));
    }
}
