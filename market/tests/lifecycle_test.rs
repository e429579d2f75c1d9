// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Integration tests for the launch market lifecycle.
//!
//! These tests drive the public `Market` API the way the node does:
//! launch, commit, upvote, migrate, trade. They cover the properties the
//! market promises across module boundaries: one-shot migration, per-wallet
//! idempotency, reversible trades, and all-or-nothing failures.

use launchpad_market::config::COMMIT_PRESETS;
use launchpad_market::curve::cumulative_cost;
use launchpad_market::{ErrorKind, Market, MarketConfig, NewToken, Phase, Token};

const EPS: f64 = 1e-9;

/// Helper: a market with the default configuration.
fn market() -> Market {
    Market::new(MarketConfig::default()).unwrap()
}

/// Helper: launches a token with the reference curve (A = 0.1, B = 2).
fn launch(market: &Market, ticker: &str) -> Token {
    market
        .create_token(NewToken::new(
            format!("{ticker} token"),
            ticker,
            "integration test token",
            "https://img.example/token.png",
            0.1,
            2.0,
        ))
        .unwrap()
}

/// Helper: migrates `token` and grows its supply to `supply` via upvotes.
fn migrated(market: &Market, ticker: &str, supply: usize) -> Token {
    let token = launch(market, ticker);
    market.commit(&token.id, "seed-wallet", 0.2).unwrap();
    for i in 0..supply {
        market.upvote(&token.id, &format!("upvoter-{i}")).unwrap();
    }
    market.find_by_id(&token.id).unwrap()
}

// ---------------------------------------------------------------------------
// Lifecycle Tests
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle_happy_path() {
    let market = market();
    let token = launch(&market, "MOON");
    assert_eq!(token.phase(), Phase::Bonding);

    // 1. Upvotes grow supply while bonding.
    market.upvote(&token.id, "alice").unwrap();
    market.upvote(&token.id, "bob").unwrap();

    // 2. First commit migrates (fresh target is zero).
    let receipt = market.commit(&token.id, "carol", 1.5).unwrap();
    assert!(receipt.migrated_now);
    assert_eq!(receipt.token.phase(), Phase::Migrated);

    // 3. Trade.
    let buy = market.buy_migrated(&token.id, "dave", 3.0).unwrap();
    assert_eq!(buy.token.supply, 5.0);
    let sell = market.sell_migrated(&token.id, "dave", 1.0).unwrap();
    assert_eq!(sell.token.supply, 4.0);

    // 4. A later commit still adds to funding but does not migrate again.
    let late = market.commit(&token.id, "erin", 0.5).unwrap();
    assert!(!late.migrated_now);

    let final_state = market.find_by_id(&token.id).unwrap();
    assert_eq!(final_state.collective_funding, 2.0);
    assert_eq!(final_state.supply, 4.0);
    assert!(final_state.migrated);
}

#[test]
fn reference_curve_fresh_token_migrates_on_any_preset() {
    for preset in COMMIT_PRESETS {
        let market = market();
        let token = launch(&market, "REF");
        assert_eq!(token.funding_target, 0.0);

        let receipt = market.commit(&token.id, "wallet", preset).unwrap();
        assert!(receipt.token.migrated, "preset {preset} should migrate");
    }
}

#[test]
fn migration_is_never_reverted_or_retriggered() {
    let market = market();
    let token = launch(&market, "MONO");

    let first = market.commit(&token.id, "w0", 0.2).unwrap();
    assert!(first.migrated_now);
    let stamp = first.token.migrated_at;

    for i in 1..COMMIT_PRESETS.len() {
        let receipt = market
            .commit(&token.id, &format!("w{i}"), COMMIT_PRESETS[i])
            .unwrap();
        assert!(!receipt.migrated_now);
        assert!(receipt.token.migrated);
        assert_eq!(receipt.token.migrated_at, stamp);
    }

    market.upvote(&token.id, "voter").unwrap();
    market.buy_migrated(&token.id, "trader", 1.0).unwrap();
    market.sell_migrated(&token.id, "trader", 2.0).unwrap();
    assert!(market.find_by_id(&token.id).unwrap().migrated);
}

#[test]
fn wallet_sets_render_in_insertion_order() {
    let market = market();
    let token = launch(&market, "ORDER");
    for wallet in ["zeta", "alpha", "mu"] {
        market.commit(&token.id, wallet, 0.5).unwrap();
        market.upvote(&token.id, wallet).unwrap();
    }

    let json = serde_json::to_value(market.find_by_id(&token.id).unwrap()).unwrap();
    assert_eq!(json["committed_wallets"], serde_json::json!(["zeta", "alpha", "mu"]));
    assert_eq!(json["upvoted_wallets"], serde_json::json!(["zeta", "alpha", "mu"]));
}

// ---------------------------------------------------------------------------
// Trading
// ---------------------------------------------------------------------------

#[test]
fn buy_then_sell_round_trip_restores_state() {
    let market = market();
    let token = migrated(&market, "ROUND", 4);
    let balance_before = market.balance();

    for amount in [0.5, 1.0, 2.0, 3.25] {
        let buy = market.buy_migrated(&token.id, "trader", amount).unwrap();
        let sell = market.sell_migrated(&token.id, "trader", amount).unwrap();

        assert!((buy.value - sell.value).abs() < EPS);
        assert!((sell.token.supply - 4.0).abs() < EPS);
        assert!((market.balance() - balance_before).abs() < EPS);
    }
}

#[test]
fn decimal_round_trip_leaves_full_supply_sellable() {
    for amount in [0.1, 1.1] {
        let market = market();
        let token = migrated(&market, "DEC", 4);
        let balance_before = market.balance();

        market.buy_migrated(&token.id, "trader", amount).unwrap();
        let sell = market.sell_migrated(&token.id, "trader", amount).unwrap();
        assert!((sell.token.supply - 4.0).abs() < 1e-9);
        assert!((market.balance() - balance_before).abs() < EPS);

        // The displayed supply is 4; selling all of it must work.
        let all = market.sell_migrated(&token.id, "trader", 4.0).unwrap();
        assert_eq!(all.token.supply, 0.0);
        assert_eq!(all.amount, sell.token.supply);
        assert!(market.balance() >= balance_before);
    }
}

#[test]
fn trade_prices_match_curve_integral() {
    let market = market();
    let token = migrated(&market, "PRICE", 3);

    let buy = market.buy_migrated(&token.id, "t", 2.0).unwrap();
    let expected = cumulative_cost(0.1, 2.0, 3.0, 2.0).unwrap();
    assert!((buy.value - expected).abs() < EPS);

    let sell = market.sell_migrated(&token.id, "t", 5.0).unwrap();
    let expected = cumulative_cost(0.1, 2.0, 0.0, 5.0).unwrap();
    assert!((sell.value - expected).abs() < EPS);
    assert_eq!(sell.token.supply, 0.0);
}

#[test]
fn insufficient_balance_leaves_everything_unchanged() {
    let market = Market::new(MarketConfig {
        initial_balance: 0.5,
        ..MarketConfig::default()
    })
    .unwrap();
    let token = migrated(&market, "BROKE", 10);
    let before = market.find_by_id(&token.id).unwrap();

    let err = market.buy_migrated(&token.id, "t", 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(market.balance(), 0.5);
    assert_eq!(market.find_by_id(&token.id).unwrap(), before);
}

#[test]
fn insufficient_supply_leaves_everything_unchanged() {
    let market = market();
    let token = migrated(&market, "SHORT", 2);
    let before = market.find_by_id(&token.id).unwrap();

    let err = market.sell_migrated(&token.id, "t", 2.5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientSupply);
    assert_eq!(market.balance(), 100.0);
    assert_eq!(market.find_by_id(&token.id).unwrap(), before);
}

#[test]
fn balance_never_goes_negative_through_buys() {
    let market = Market::new(MarketConfig {
        initial_balance: 5.0,
        ..MarketConfig::default()
    })
    .unwrap();
    let token = migrated(&market, "DRAIN", 0);

    let mut rejected = 0;
    for _ in 0..50 {
        match market.buy_migrated(&token.id, "t", 1.0) {
            Ok(receipt) => assert!(receipt.balance >= 0.0),
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
                rejected += 1;
            }
        }
        assert!(market.balance() >= 0.0);
    }
    assert!(rejected > 0);
}

// ---------------------------------------------------------------------------
// Error Cases
// ---------------------------------------------------------------------------

#[test]
fn ticker_uniqueness_is_case_insensitive() {
    let market = market();
    let tickers = ["pepe", "PEPE", "Pepe", " pepe ", "wojak", "WOJAK", "chad"];
    let mut accepted = 0;
    for ticker in tickers {
        match market.create_token(NewToken::new("t", ticker, "d", "i", 1.0, 1.0)) {
            Ok(_) => accepted += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::DuplicateTicker),
        }
    }
    assert_eq!(accepted, 3);

    let mut seen: Vec<_> = market.list_all().into_iter().map(|t| t.ticker).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), market.token_count());
}

#[test]
fn rejected_commit_does_not_change_funding() {
    let market = market();
    let token = launch(&market, "ONCE");
    market.commit(&token.id, "alice", 2.0).unwrap();

    let err = market.commit(&token.id, "alice", 0.2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyCommitted);
    assert_eq!(market.find_by_id(&token.id).unwrap().collective_funding, 2.0);
}

#[test]
fn unknown_token_is_not_found_everywhere() {
    let market = market();
    assert_eq!(market.commit("x", "w", 1.0).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(market.upvote("x", "w").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        market.buy_migrated("x", "w", 1.0).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        market.sell_migrated("x", "w", 1.0).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(market.record_view("x").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn invalid_curve_parameters_rejected() {
    let market = market();
    for (a, b) in [(0.0, 1.0), (1.0, 0.0), (-1.0, 2.0), (f64::NAN, 1.0)] {
        let err = market
            .create_token(NewToken::new("t", "BAD", "d", "i", a, b))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCurveParams);
    }
    assert_eq!(market.token_count(), 0);
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[test]
fn trending_returns_at_most_five_sorted_and_stable() {
    let market = market();
    let supplies = [2, 0, 5, 2, 1, 5, 3];
    let mut ids = Vec::new();
    for (i, supply) in supplies.iter().enumerate() {
        let token = launch(&market, &format!("T{i}"));
        for v in 0..*supply {
            market.upvote(&token.id, &format!("v{v}")).unwrap();
        }
        ids.push(token.id);
    }

    let trending = market.list_trending(Some(5));
    assert_eq!(trending.len(), 5);
    let tickers: Vec<_> = trending.iter().map(|t| t.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["T2", "T5", "T6", "T0", "T3"]);
    assert!(trending.windows(2).all(|w| w[0].supply >= w[1].supply));
}
