// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Token Registry
//!
//! Insertion-ordered storage for every token in the market, with two
//! indexes: id → position and ticker → id. The ticker index is what makes
//! ticker uniqueness an invariant rather than a hope.
//!
//! Each token sits behind its own `Mutex` so that operations on different
//! tokens never contend. The registry itself is not `Sync`-safe for writers;
//! the [`Market`](crate::Market) wraps it in a `RwLock` and takes the write
//! side only to insert.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::MarketError;
use crate::token::{Token, TokenId};

/// Shared handle to a single token's state.
pub type TokenHandle = Arc<Mutex<Token>>;

/// Ordered token collection with id and ticker indexes.
#[derive(Debug, Default)]
pub struct Registry {
    /// Tokens in creation order.
    tokens: Vec<TokenHandle>,
    /// Position of each token in `tokens`, by id.
    by_id: HashMap<TokenId, usize>,
    /// Uppercase ticker → token id.
    tickers: HashMap<String, TokenId>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a token with this (already normalized) ticker is
    /// registered.
    pub fn contains_ticker(&self, ticker: &str) -> bool {
        self.tickers.contains_key(ticker)
    }

    /// Registers a token and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DuplicateTicker`] if the ticker is taken and
    /// [`MarketError::Internal`] if the id is (somehow) already present.
    pub fn insert(&mut self, token: Token) -> Result<TokenHandle, MarketError> {
        if self.contains_ticker(&token.ticker) {
            return Err(MarketError::DuplicateTicker(token.ticker));
        }
        if self.by_id.contains_key(&token.id) {
            return Err(MarketError::Internal(format!(
                "token id {} registered twice",
                token.id
            )));
        }

        let id = token.id.clone();
        let ticker = token.ticker.clone();
        let handle = Arc::new(Mutex::new(token));

        self.by_id.insert(id.clone(), self.tokens.len());
        self.tickers.insert(ticker, id);
        self.tokens.push(Arc::clone(&handle));

        Ok(handle)
    }

    /// Looks up a token by id.
    pub fn get(&self, id: &str) -> Option<&TokenHandle> {
        self.by_id.get(id).map(|&index| &self.tokens[index])
    }

    /// Looks up a token by id, or fails with [`MarketError::NotFound`].
    pub fn require(&self, id: &str) -> Result<&TokenHandle, MarketError> {
        self.get(id)
            .ok_or_else(|| MarketError::NotFound(id.to_string()))
    }

    /// Locks every token in creation order and holds the guards.
    ///
    /// While the guards live no operation can change any token, which lets
    /// a caller read the balance consistently with the tokens. Callers must
    /// not hold the balance lock when calling this.
    pub fn lock_all(&self) -> Vec<MutexGuard<'_, Token>> {
        self.tokens.iter().map(|handle| handle.lock()).collect()
    }

    /// Clones every token in creation order.
    ///
    /// Each token is cloned under its own lock, so no snapshot is torn.
    pub fn snapshot_all(&self) -> Vec<Token> {
        self.tokens.iter().map(|handle| handle.lock().clone()).collect()
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no token has been registered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Sorts `tokens` by supply, highest first, and keeps the first `limit`.
///
/// The sort is stable, so tokens with equal supply keep their creation
/// order.
pub fn rank_trending(mut tokens: Vec<Token>, limit: usize) -> Vec<Token> {
    tokens.sort_by(|a, b| b.supply.total_cmp(&a.supply));
    tokens.truncate(limit);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::NewToken;

    fn token(ticker: &str) -> Token {
        Token::from_request(NewToken::new("T", ticker, "d", "img", 0.1, 2.0)).unwrap()
    }

    #[test]
    fn insert_indexes_by_id_and_ticker() {
        let mut registry = Registry::new();
        let t = token("AAA");
        let id = t.id.clone();
        registry.insert(t).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains_ticker("AAA"));
        assert_eq!(registry.get(&id).unwrap().lock().ticker, "AAA");
    }

    #[test]
    fn duplicate_ticker_rejected() {
        let mut registry = Registry::new();
        registry.insert(token("AAA")).unwrap();
        let err = registry.insert(token("aaa")).unwrap_err();
        assert_eq!(err, MarketError::DuplicateTicker("AAA".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = Registry::new();
        assert!(registry.get("nope").is_none());
        assert_eq!(
            registry.require("nope").unwrap_err(),
            MarketError::NotFound("nope".into())
        );
    }

    #[test]
    fn snapshot_keeps_creation_order() {
        let mut registry = Registry::new();
        for ticker in ["CCC", "AAA", "BBB"] {
            registry.insert(token(ticker)).unwrap();
        }
        let tickers: Vec<_> = registry
            .snapshot_all()
            .into_iter()
            .map(|t| t.ticker)
            .collect();
        assert_eq!(tickers, vec!["CCC", "AAA", "BBB"]);
    }

    #[test]
    fn trending_sorts_descending_and_is_stable() {
        let supplies = [("A", 1.0), ("B", 3.0), ("C", 1.0), ("D", 3.0), ("E", 0.0), ("F", 2.0)];
        let tokens: Vec<Token> = supplies
            .iter()
            .map(|(ticker, supply)| {
                let mut t = token(ticker);
                t.supply = *supply;
                t
            })
            .collect();

        let ranked: Vec<_> = rank_trending(tokens, 5)
            .into_iter()
            .map(|t| t.ticker)
            .collect();
        assert_eq!(ranked, vec!["B", "D", "F", "A", "C"]);
    }

    #[test]
    fn trending_limit_larger_than_registry() {
        let ranked = rank_trending(vec![token("ONE")], 5);
        assert_eq!(ranked.len(), 1);
        assert!(rank_trending(Vec::new(), 5).is_empty());
    }
}
