// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Token Entity
//!
//! A [`Token`] is everything the market knows about one launched token:
//! identity and metadata, its curve, its economic state (supply, collective
//! funding, funding target), engagement (comments, views), the wallets that
//! committed or upvoted, and whether it has migrated.
//!
//! Tokens are created from a [`NewToken`] request. The request schema is
//! fixed: unknown fields are rejected at deserialization, and required
//! fields that are absent or blank surface as
//! [`MarketError::MissingField`] when the request is validated.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SUPPLY_TOLERANCE;
use crate::curve::CurveParams;
use crate::error::MarketError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Unique identifier for a token, assigned by the market at creation time.
pub type TokenId = String;

/// Which pricing regime a token is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Collecting commits toward the funding target.
    Bonding,
    /// Funding target met; trades against the global balance.
    Migrated,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Bonding => write!(f, "Bonding"),
            Phase::Migrated => write!(f, "Migrated"),
        }
    }
}

/// Optional social links attached to a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
}

impl TokenLinks {
    /// Drops blank links so that `Some("")` never reaches a token.
    fn normalized(self) -> Self {
        let keep = |link: Option<String>| {
            link.map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
        };
        Self {
            website: keep(self.website),
            twitter: keep(self.twitter),
            telegram: keep(self.telegram),
        }
    }
}

/// A comment left on a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Display name of the commenter.
    pub author: String,
    /// Comment body.
    pub text: String,
    /// When the comment was accepted.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WalletSet
// ---------------------------------------------------------------------------

/// A set of wallet identifiers that remembers insertion order.
///
/// Membership checks go through a `HashSet`; rendering goes through the
/// insertion-ordered `Vec`, so serialized tokens are stable across runs.
/// Serializes as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct WalletSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl WalletSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `wallet`. Returns `false` (and changes nothing) if it was
    /// already present.
    pub fn insert(&mut self, wallet: impl Into<String>) -> bool {
        let wallet = wallet.into();
        if self.members.contains(&wallet) {
            return false;
        }
        self.members.insert(wallet.clone());
        self.order.push(wallet);
        true
    }

    /// Returns `true` if `wallet` is in the set.
    pub fn contains(&self, wallet: &str) -> bool {
        self.members.contains(wallet)
    }

    /// Number of wallets.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no wallet has been added.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Wallets in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for WalletSet {
    fn from(wallets: Vec<String>) -> Self {
        let mut set = WalletSet::new();
        for wallet in wallets {
            set.insert(wallet);
        }
        set
    }
}

impl From<WalletSet> for Vec<String> {
    fn from(set: WalletSet) -> Self {
        set.order
    }
}

// ---------------------------------------------------------------------------
// NewToken
// ---------------------------------------------------------------------------

/// Request to create a token.
///
/// Every field is optional at the type level so that an absent field is
/// reported as [`MarketError::MissingField`] rather than as a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewToken {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub curve_a: Option<f64>,
    #[serde(default)]
    pub curve_b: Option<f64>,
    #[serde(default)]
    pub links: Option<TokenLinks>,
}

impl NewToken {
    /// Builds a complete request without links.
    pub fn new(
        title: impl Into<String>,
        ticker: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        curve_a: f64,
        curve_b: f64,
    ) -> Self {
        Self {
            title: Some(title.into()),
            ticker: Some(ticker.into()),
            description: Some(description.into()),
            image: Some(image.into()),
            curve_a: Some(curve_a),
            curve_b: Some(curve_b),
            links: None,
        }
    }

    /// Attaches social links.
    pub fn with_links(mut self, links: TokenLinks) -> Self {
        self.links = Some(links);
        self
    }

    /// Normalized ticker, if one was supplied: trimmed and uppercased.
    pub fn normalized_ticker(&self) -> Option<String> {
        self.ticker
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_uppercase)
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, MarketError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(MarketError::MissingField(field))
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A launched token and its full market state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Unique token identifier.
    pub id: TokenId,
    /// Uppercase ticker. Unique across the market.
    pub ticker: String,
    pub title: String,
    pub description: String,
    /// Image reference (URL or asset key).
    pub image: String,
    #[serde(default)]
    pub links: TokenLinks,
    /// Curve parameters, fixed at creation.
    pub curve: CurveParams,
    /// Virtual supply. Never negative.
    pub supply: f64,
    /// Sum of accepted commits before migration.
    pub collective_funding: f64,
    /// Funding needed to migrate, fixed at creation.
    pub funding_target: f64,
    pub view_count: u64,
    pub comments: Vec<Comment>,
    pub committed_wallets: WalletSet,
    pub upvoted_wallets: WalletSet,
    /// Flips to `true` exactly once.
    pub migrated: bool,
    #[serde(default)]
    pub migrated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Validates a creation request and builds a fresh token.
    ///
    /// Ticker uniqueness is the registry's job; everything else is checked
    /// here, missing fields first, then the curve.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::MissingField`] for an absent or blank field
    /// and [`MarketError::InvalidCurveParams`] for a bad curve.
    pub fn from_request(request: NewToken) -> Result<Self, MarketError> {
        let ticker = request
            .normalized_ticker()
            .ok_or(MarketError::MissingField("ticker"))?;
        let title = required("title", request.title)?;
        let description = required("description", request.description)?;
        let image = required("image", request.image)?;
        let a = request.curve_a.ok_or(MarketError::MissingField("curve_a"))?;
        let b = request.curve_b.ok_or(MarketError::MissingField("curve_b"))?;

        let curve = CurveParams::new(a, b)?;
        let supply = 0.0;
        let funding_target = curve.funding_target(supply)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            ticker,
            title,
            description,
            image,
            links: request.links.unwrap_or_default().normalized(),
            curve,
            supply,
            collective_funding: 0.0,
            funding_target,
            view_count: 0,
            comments: Vec::new(),
            committed_wallets: WalletSet::new(),
            upvoted_wallets: WalletSet::new(),
            migrated: false,
            migrated_at: None,
            created_at: Utc::now(),
        })
    }

    /// Current pricing regime.
    pub fn phase(&self) -> Phase {
        if self.migrated {
            Phase::Migrated
        } else {
            Phase::Bonding
        }
    }

    /// Marginal price at the current supply.
    pub fn spot_price(&self) -> Result<f64, MarketError> {
        self.curve.spot_price(self.supply)
    }

    /// Spot price times supply.
    pub fn market_cap(&self) -> Result<f64, MarketError> {
        Ok(self.spot_price()? * self.supply)
    }

    /// Funding progress toward migration as a percentage in `[0, 100]`.
    ///
    /// A zero target counts as fully funded.
    pub fn funding_progress(&self) -> f64 {
        if self.funding_target <= 0.0 {
            return 100.0;
        }
        (self.collective_funding / self.funding_target * 100.0).clamp(0.0, 100.0)
    }

    /// Price of buying `amount` at the current supply.
    pub fn quote_buy(&self, amount: f64) -> Result<f64, MarketError> {
        self.curve.cost(self.supply, amount)
    }

    /// Refund for selling `amount` at the current supply.
    ///
    /// A request that exceeds the supply only by f64 rounding sells the
    /// whole supply.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InsufficientSupply`] if `amount` exceeds the
    /// supply by more than [`SUPPLY_TOLERANCE`].
    pub fn quote_sell(&self, amount: f64) -> Result<f64, MarketError> {
        let sold = self.sellable(amount)?;
        self.curve.cost(self.supply - sold, sold)
    }

    /// Supply left after selling `amount`. Remainders within rounding of
    /// zero are zero.
    ///
    /// # Errors
    ///
    /// Same as [`Token::quote_sell`].
    pub fn supply_after_sell(&self, amount: f64) -> Result<f64, MarketError> {
        let rest = self.supply - self.sellable(amount)?;
        if rest <= supply_slack(self.supply) {
            Ok(0.0)
        } else {
            Ok(rest)
        }
    }

    /// The amount a sell of `amount` actually removes.
    fn sellable(&self, amount: f64) -> Result<f64, MarketError> {
        if amount <= self.supply {
            return Ok(amount);
        }
        if amount - self.supply <= supply_slack(self.supply) {
            return Ok(self.supply);
        }
        Err(MarketError::InsufficientSupply {
            requested: amount,
            available: self.supply,
        })
    }
}

fn supply_slack(supply: f64) -> f64 {
    SUPPLY_TOLERANCE * supply.max(1.0)
}
