// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Lifecycle Engine
//!
//! The [`Market`] is the context object every operation runs against: the
//! token registry, the global virtual balance, and the configuration. There
//! are no process-wide globals; a test that wants a market builds one.
//!
//! ## Token Lifecycle
//!
//! ```text
//!   create ──► Bonding ──(commit pushes funding ≥ target)──► Migrated
//!                 │                                             │
//!            commit, upvote                        buy, sell, upvote, commit
//! ```
//!
//! The transition is one-way and happens only inside [`Market::commit`].
//! Funding is frozen once a token migrates: later commits are still
//! accepted (each wallet once), but they no longer move the total.
//!
//! ## Atomicity
//!
//! Every operation validates its inputs and computes every derived number
//! (prices, refunds, new totals) before it writes a single field. The
//! traded token's lock and the balance lock are held together for the
//! whole of a buy or sell, so supply and balance always change together.
//! Locks are taken in one order only: registry, then token, then balance.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::balance::VirtualBalance;
use crate::config::{is_commit_preset, MarketConfig, UPVOTE_SUPPLY_UNIT};
use crate::error::MarketError;
use crate::registry::{rank_trending, Registry};
use crate::token::{NewToken, Token};

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Outcome of an accepted commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// The token after the commit.
    pub token: Token,
    /// The committed amount.
    pub amount: f64,
    /// `true` if this commit is the one that migrated the token.
    pub migrated_now: bool,
}

/// Direction of a migrated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// Outcome of a migrated buy or sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// The token after the trade.
    pub token: Token,
    pub side: TradeSide,
    /// Supply bought or sold.
    pub amount: f64,
    /// Price paid (buy) or refund received (sell).
    pub value: f64,
    /// Global balance after the trade.
    pub balance: f64,
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// The launch market: registry, global balance, and configuration.
///
/// `Send + Sync`; share it as `Arc<Market>`.
#[derive(Debug)]
pub struct Market {
    config: MarketConfig,
    registry: RwLock<Registry>,
    balance: Mutex<VirtualBalance>,
}

impl Market {
    /// Creates an empty market.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidAmount`] if `config.initial_balance` is
    /// negative or not finite.
    pub fn new(config: MarketConfig) -> Result<Self, MarketError> {
        let balance = VirtualBalance::new(config.initial_balance)?;
        Ok(Self::from_parts(config, Registry::new(), balance))
    }

    pub(crate) fn from_parts(
        config: MarketConfig,
        registry: Registry,
        balance: VirtualBalance,
    ) -> Self {
        Self {
            config,
            registry: RwLock::new(registry),
            balance: Mutex::new(balance),
        }
    }

    /// The configuration this market was built with.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Current global balance.
    pub fn balance(&self) -> f64 {
        self.balance.lock().amount()
    }

    /// Number of registered tokens.
    pub fn token_count(&self) -> usize {
        self.registry.read().len()
    }

    // -- Registry operations ------------------------------------------------

    /// Creates and registers a token.
    ///
    /// The ticker is normalized to uppercase before the uniqueness check.
    /// The funding target is computed from the initial supply of zero, so a
    /// fresh token migrates on its first valid commit.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingField`], [`MarketError::InvalidCurveParams`],
    /// or [`MarketError::DuplicateTicker`].
    pub fn create_token(&self, request: NewToken) -> Result<Token, MarketError> {
        let token = Token::from_request(request)?;

        let handle = {
            let mut registry = self.registry.write();
            registry.insert(token)?
        };
        let token = handle.lock().clone();

        tracing::info!(
            token_id = %token.id,
            ticker = %token.ticker,
            curve_a = token.curve.a,
            curve_b = token.curve.b,
            funding_target = token.funding_target,
            "token created"
        );
        Ok(token)
    }

    /// Returns a snapshot of the token with this id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if no such token exists.
    pub fn find_by_id(&self, token_id: &str) -> Result<Token, MarketError> {
        let registry = self.registry.read();
        let token = registry.require(token_id)?.lock().clone();
        Ok(token)
    }

    /// Every token, in creation order.
    pub fn list_all(&self) -> Vec<Token> {
        self.registry.read().snapshot_all()
    }

    /// Up to `limit` tokens by descending supply, ties in creation order.
    ///
    /// `None` uses the configured trending limit.
    pub fn list_trending(&self, limit: Option<usize>) -> Vec<Token> {
        let limit = limit.unwrap_or(self.config.trending_limit);
        rank_trending(self.list_all(), limit)
    }

    /// Migrated tokens, in creation order.
    pub fn list_migrated(&self) -> Vec<Token> {
        self.list_all().into_iter().filter(|t| t.migrated).collect()
    }

    // -- Lifecycle operations -----------------------------------------------

    /// Commits `amount` from `wallet_id` toward a token's funding target.
    ///
    /// `amount` must be one of [`COMMIT_PRESETS`](crate::config::COMMIT_PRESETS).
    /// Each wallet commits to a given token at most once. Every accepted
    /// commit adds to the collective funding. If the token had not migrated
    /// and the new total reaches the funding target, the token migrates as
    /// part of this call; later commits never migrate it again.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingWallet`], [`MarketError::InvalidAmount`],
    /// [`MarketError::NotFound`], or [`MarketError::AlreadyCommitted`].
    pub fn commit(
        &self,
        token_id: &str,
        wallet_id: &str,
        amount: f64,
    ) -> Result<CommitReceipt, MarketError> {
        let wallet = require_wallet(wallet_id)?;
        if !is_commit_preset(amount) {
            return Err(MarketError::InvalidAmount {
                amount,
                reason: "commit amount must be one of 0.2, 0.5, 1, 1.5, 2",
            });
        }

        self.with_token(token_id, |token| {
            if token.committed_wallets.contains(wallet) {
                return Err(MarketError::AlreadyCommitted {
                    token_id: token.id.clone(),
                    wallet: wallet.to_string(),
                });
            }

            let was_migrated = token.migrated;
            let funding = token.collective_funding + amount;
            if !funding.is_finite() {
                return Err(MarketError::Internal(format!(
                    "collective funding of {} is not finite",
                    token.id
                )));
            }

            token.committed_wallets.insert(wallet);
            token.collective_funding = funding;
            let migrated_now =
                !was_migrated && token.collective_funding >= token.funding_target && migrate(token);

            tracing::debug!(
                token_id = %token.id,
                wallet = %wallet,
                amount,
                collective_funding = token.collective_funding,
                funding_target = token.funding_target,
                "commit accepted"
            );

            Ok(CommitReceipt {
                token: token.clone(),
                amount,
                migrated_now,
            })
        })
    }

    /// Upvotes a token, adding one unit of supply.
    ///
    /// Each wallet upvotes a given token at most once. Upvotes never touch
    /// funding or migration.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingWallet`], [`MarketError::NotFound`], or
    /// [`MarketError::AlreadyUpvoted`].
    pub fn upvote(&self, token_id: &str, wallet_id: &str) -> Result<Token, MarketError> {
        let wallet = require_wallet(wallet_id)?;

        self.with_token(token_id, |token| {
            if token.upvoted_wallets.contains(wallet) {
                return Err(MarketError::AlreadyUpvoted {
                    token_id: token.id.clone(),
                    wallet: wallet.to_string(),
                });
            }

            let supply = token.supply + UPVOTE_SUPPLY_UNIT;
            if !supply.is_finite() {
                return Err(MarketError::Internal(format!(
                    "supply of {} is not finite",
                    token.id
                )));
            }

            token.upvoted_wallets.insert(wallet);
            token.supply = supply;

            tracing::debug!(token_id = %token.id, wallet = %wallet, supply, "upvote accepted");
            Ok(token.clone())
        })
    }

    /// Buys `sol_amount` of a migrated token's supply from the global
    /// balance.
    ///
    /// Price is the curve integral from the current supply over
    /// `sol_amount`.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingWallet`], [`MarketError::InvalidAmount`],
    /// [`MarketError::NotFound`], [`MarketError::NotMigrated`], or
    /// [`MarketError::InsufficientBalance`].
    pub fn buy_migrated(
        &self,
        token_id: &str,
        wallet_id: &str,
        sol_amount: f64,
    ) -> Result<TradeReceipt, MarketError> {
        let wallet = require_wallet(wallet_id)?;
        require_trade_amount(sol_amount)?;

        self.with_token(token_id, |token| {
            require_migrated(token)?;

            let price = token.quote_buy(sol_amount)?;
            let supply = token.supply + sol_amount;
            if !supply.is_finite() {
                return Err(MarketError::Internal(format!(
                    "supply of {} is not finite",
                    token.id
                )));
            }

            let mut balance = self.balance.lock();
            let remaining = balance.debit(price)?;
            token.supply = supply;

            tracing::info!(
                token_id = %token.id,
                wallet = %wallet,
                amount = sol_amount,
                price,
                supply,
                balance = remaining,
                "migrated buy"
            );

            Ok(TradeReceipt {
                token: token.clone(),
                side: TradeSide::Buy,
                amount: sol_amount,
                value: price,
                balance: remaining,
            })
        })
    }

    /// Sells `sol_amount` of a migrated token's supply back for a refund to
    /// the global balance.
    ///
    /// The refund is the curve integral over the interval being removed,
    /// `[supply - sol_amount, supply]`, so it exactly matches what buying
    /// that interval cost. A request within
    /// [`SUPPLY_TOLERANCE`](crate::config::SUPPLY_TOLERANCE) of the whole
    /// supply sells all of it; the receipt reports the amount actually sold.
    ///
    /// # Errors
    ///
    /// [`MarketError::MissingWallet`], [`MarketError::InvalidAmount`],
    /// [`MarketError::NotFound`], [`MarketError::NotMigrated`], or
    /// [`MarketError::InsufficientSupply`].
    pub fn sell_migrated(
        &self,
        token_id: &str,
        wallet_id: &str,
        sol_amount: f64,
    ) -> Result<TradeReceipt, MarketError> {
        let wallet = require_wallet(wallet_id)?;
        require_trade_amount(sol_amount)?;

        self.with_token(token_id, |token| {
            require_migrated(token)?;

            let refund = token.quote_sell(sol_amount)?;
            let supply = token.supply_after_sell(sol_amount)?;
            let sold = if supply == 0.0 { token.supply } else { sol_amount };

            let mut balance = self.balance.lock();
            let remaining = balance.credit(refund)?;
            token.supply = supply;

            tracing::info!(
                token_id = %token.id,
                wallet = %wallet,
                amount = sold,
                refund,
                supply,
                balance = remaining,
                "migrated sell"
            );

            Ok(TradeReceipt {
                token: token.clone(),
                side: TradeSide::Sell,
                amount: sold,
                value: refund,
                balance: remaining,
            })
        })
    }

    // -- Internals ----------------------------------------------------------

    /// Runs `op` against one token while holding its lock.
    ///
    /// The registry read lock is held for the duration, which keeps the
    /// registry → token → balance lock order.
    pub(crate) fn with_token<T>(
        &self,
        token_id: &str,
        op: impl FnOnce(&mut Token) -> Result<T, MarketError>,
    ) -> Result<T, MarketError> {
        let registry = self.registry.read();
        let mut token = registry.require(token_id)?.lock();
        op(&mut token)
    }

    pub(crate) fn registry(&self) -> &RwLock<Registry> {
        &self.registry
    }
}

/// Flips a token into the migrated phase.
///
/// Returns `true` if this call did the flip and `false` if the token had
/// already migrated, in which case nothing changes.
fn migrate(token: &mut Token) -> bool {
    if token.migrated {
        return false;
    }
    token.migrated = true;
    token.migrated_at = Some(chrono::Utc::now());

    tracing::info!(
        token_id = %token.id,
        ticker = %token.ticker,
        collective_funding = token.collective_funding,
        funding_target = token.funding_target,
        "token migrated"
    );
    true
}

fn require_wallet(wallet_id: &str) -> Result<&str, MarketError> {
    let wallet = wallet_id.trim();
    if wallet.is_empty() {
        return Err(MarketError::MissingWallet);
    }
    Ok(wallet)
}

fn require_trade_amount(amount: f64) -> Result<(), MarketError> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(MarketError::InvalidAmount {
            amount,
            reason: "trade amount must be a positive finite number",
        });
    }
    Ok(())
}

fn require_migrated(token: &Token) -> Result<(), MarketError> {
    if !token.migrated {
        return Err(MarketError::NotMigrated(token.id.clone()));
    }
    Ok(())
}
