// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Launchpad Market: Core Library
//!
//! A token-launch market where every token is priced by its own power-law
//! bonding curve. Users create tokens, commit funds toward a migration
//! threshold, and upvote tokens to grow their virtual supply. Once the
//! collective funding of a token reaches its target, the token migrates and
//! starts trading continuously against a shared virtual balance.
//!
//! Migration here is a state flag, not a settlement. Nothing in this crate
//! touches a real chain, and nothing in this crate pretends to.
//!
//! ## Architecture
//!
//! - **config**: Constants and runtime tunables. Magic numbers live here.
//! - **error**: The one error type every operation returns.
//! - **curve**: Pure pricing math over `price(x) = A·x^B`.
//! - **token**: The token entity and its request schema.
//! - **registry**: Insertion-ordered token storage with a ticker index.
//! - **balance**: The shared virtual balance.
//! - **lifecycle**: The [`Market`] context: commit, upvote, migrate, trade.
//! - **engagement**: Comments and view counts.
//! - **events**: What happened, in a shape worth broadcasting.
//! - **snapshot**: Whole-market serialization for restarts.
//!
//! ## Design Philosophy
//!
//! 1. The [`Market`] is an explicit context object. No process-wide globals,
//!    so every test gets its own isolated market.
//! 2. Every operation validates everything before it writes anything.
//!    Failures never leave a token half-updated.
//! 3. State transitions are one-way. A migrated token stays migrated.
//! 4. If it touches the balance, it has tests. Plural.

pub mod balance;
pub mod config;
pub mod curve;
pub mod engagement;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod snapshot;
pub mod token;

pub use config::MarketConfig;
pub use curve::CurveParams;
pub use error::{ErrorKind, MarketError};
pub use events::MarketEvent;
pub use lifecycle::{CommitReceipt, Market, TradeReceipt, TradeSide};
pub use snapshot::{MarketSnapshot, SnapshotError};
pub use token::{Comment, NewToken, Phase, Token, TokenId, TokenLinks, WalletSet};

/// Crate version, as reported by the node's `version` subcommand.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
