// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Market events.
//!
//! The market itself does not broadcast anything. Operations return
//! receipts, and the layer that owns a channel (the node's WebSocket feed)
//! turns those receipts into [`MarketEvent`]s.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{CommitReceipt, TradeReceipt, TradeSide};
use crate::token::{Comment, Token};

/// Something that happened in the market, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A token was launched.
    TokenCreated {
        token_id: String,
        ticker: String,
        funding_target: f64,
    },
    /// A commit was accepted.
    Committed {
        token_id: String,
        wallet_id: String,
        amount: f64,
        collective_funding: f64,
    },
    /// A token crossed its funding target.
    Migrated {
        token_id: String,
        ticker: String,
        collective_funding: f64,
        funding_target: f64,
    },
    /// An upvote was accepted.
    Upvoted {
        token_id: String,
        wallet_id: String,
        supply: f64,
    },
    /// A migrated buy or sell settled.
    Traded {
        token_id: String,
        side: TradeSide,
        amount: f64,
        value: f64,
        supply: f64,
        balance: f64,
    },
    /// A comment was posted.
    Commented {
        token_id: String,
        author: String,
    },
}

impl MarketEvent {
    pub fn token_created(token: &Token) -> Self {
        MarketEvent::TokenCreated {
            token_id: token.id.clone(),
            ticker: token.ticker.clone(),
            funding_target: token.funding_target,
        }
    }

    /// The events a commit produced: always `Committed`, followed by
    /// `Migrated` when this commit flipped the token.
    pub fn from_commit(wallet_id: &str, receipt: &CommitReceipt) -> Vec<Self> {
        let token = &receipt.token;
        let mut events = vec![MarketEvent::Committed {
            token_id: token.id.clone(),
            wallet_id: wallet_id.to_string(),
            amount: receipt.amount,
            collective_funding: token.collective_funding,
        }];
        if receipt.migrated_now {
            events.push(MarketEvent::Migrated {
                token_id: token.id.clone(),
                ticker: token.ticker.clone(),
                collective_funding: token.collective_funding,
                funding_target: token.funding_target,
            });
        }
        events
    }

    pub fn upvoted(wallet_id: &str, token: &Token) -> Self {
        MarketEvent::Upvoted {
            token_id: token.id.clone(),
            wallet_id: wallet_id.to_string(),
            supply: token.supply,
        }
    }

    pub fn commented(token_id: &str, comment: &Comment) -> Self {
        MarketEvent::Commented {
            token_id: token_id.to_string(),
            author: comment.author.clone(),
        }
    }
}

impl From<&TradeReceipt> for MarketEvent {
    fn from(receipt: &TradeReceipt) -> Self {
        MarketEvent::Traded {
            token_id: receipt.token.id.clone(),
            side: receipt.side,
            amount: receipt.amount,
            value: receipt.value,
            supply: receipt.token.supply,
            balance: receipt.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use crate::lifecycle::Market;
    use crate::token::NewToken;

    #[test]
    fn migrating_commit_yields_two_events() {
        let market = Market::new(MarketConfig::default()).unwrap();
        let token = market
            .create_token(NewToken::new("E", "EVT", "d", "i", 0.1, 2.0))
            .unwrap();

        let first = market.commit(&token.id, "alice", 1.0).unwrap();
        let events = MarketEvent::from_commit("alice", &first);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], MarketEvent::Migrated { .. }));

        let second = market.commit(&token.id, "bob", 1.0).unwrap();
        assert_eq!(MarketEvent::from_commit("bob", &second).len(), 1);
    }

    #[test]
    fn events_are_tagged_by_type() {
        let event = MarketEvent::Upvoted {
            token_id: "t".into(),
            wallet_id: "w".into(),
            supply: 1.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "upvoted");
        assert_eq!(json["supply"], 1.0);
    }

    #[test]
    fn trade_event_carries_balance() {
        let market = Market::new(MarketConfig::default()).unwrap();
        let token = market
            .create_token(NewToken::new("E", "TRD", "d", "i", 0.1, 2.0))
            .unwrap();
        market.commit(&token.id, "alice", 0.2).unwrap();
        let receipt = market.buy_migrated(&token.id, "alice", 1.0).unwrap();

        match MarketEvent::from(&receipt) {
            MarketEvent::Traded { side, balance, .. } => {
                assert_eq!(side, TradeSide::Buy);
                assert_eq!(balance, market.balance());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
