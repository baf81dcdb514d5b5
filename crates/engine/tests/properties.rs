//! Randomized order-stream properties: cash conservation, position
//! consistency, and the no-negative-cash / no-short invariants, checked with
//! exact decimal arithmetic over a seeded stream of market orders.

use configuration::Config;
use core_types::{OrderRequest, OrderSide, OrderStatus};
use engine::PaperTradingEngine;
use market_data::{QuoteSource, StaticQuoteSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "GOOG"];

#[tokio::test]
async fn random_order_streams_conserve_cash_and_positions() {
    let mut config = Config::default();
    // A non-zero commission exercises the fee legs of the conservation sums.
    config.simulation.commission_per_trade = dec!(1);

    let quotes = Arc::new(StaticQuoteSource::new(config.simulation.spread_pct));
    quotes.set_price("AAPL", dec!(100)).await;
    quotes.set_price("MSFT", dec!(250)).await;
    quotes.set_price("GOOG", dec!(50)).await;

    let engine = PaperTradingEngine::new(config, quotes.clone() as Arc<dyn QuoteSource>);
    let initial_cash = dec!(1000000);
    let portfolio = engine
        .create_portfolio("property", initial_cash)
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for step in 0..300 {
        let symbol = SYMBOLS[rng.gen_range(0..SYMBOLS.len())];
        let side = if rng.gen_bool(0.5) {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let quantity = Decimal::from(rng.gen_range(1..=20u32));

        let order = engine
            .place_order(portfolio.id, OrderRequest::market(symbol, side, quantity))
            .await
            .unwrap();
        assert!(
            matches!(order.status, OrderStatus::Filled | OrderStatus::Rejected),
            "market order left in unexpected state at step {step}: {:?}",
            order.status
        );

        let state = engine.get_portfolio(portfolio.id).await.unwrap();
        assert!(
            state.cash >= Decimal::ZERO,
            "cash went negative at step {step}: {}",
            state.cash
        );
        for position in state.positions.values() {
            assert!(
                position.quantity > Decimal::ZERO,
                "short or flat position left in the map at step {step}"
            );
        }
    }

    let state = engine.get_portfolio(portfolio.id).await.unwrap();

    // Cash conservation, recomputed exactly from the execution ledger.
    let mut expected_cash = initial_cash;
    for execution in &state.executions {
        let notional = execution.price * execution.quantity;
        match execution.side {
            OrderSide::Buy => expected_cash -= notional + execution.commission,
            OrderSide::Sell => expected_cash += notional - execution.commission,
        }
    }
    assert_eq!(state.cash, expected_cash);

    // Position consistency: quantity equals the signed execution sum per symbol.
    let mut signed_sums: HashMap<String, Decimal> = HashMap::new();
    for execution in &state.executions {
        let entry = signed_sums
            .entry(execution.symbol.clone())
            .or_insert(Decimal::ZERO);
        match execution.side {
            OrderSide::Buy => *entry += execution.quantity,
            OrderSide::Sell => *entry -= execution.quantity,
        }
    }
    for symbol in SYMBOLS {
        let expected = signed_sums.get(symbol).copied().unwrap_or(Decimal::ZERO);
        assert_eq!(state.position_quantity(symbol), expected, "{symbol}");
    }

    // Every order is accounted for, none lost or duplicated.
    let fills = state
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Filled)
        .count();
    assert_eq!(state.orders.len(), 300);
    assert_eq!(state.executions.len(), fills);
}

#[tokio::test]
async fn rejected_orders_never_touch_state() {
    let config = Config::default();
    let quotes = Arc::new(StaticQuoteSource::new(config.simulation.spread_pct));
    quotes.set_price("AAPL", dec!(100)).await;

    let engine = PaperTradingEngine::new(config, quotes as Arc<dyn QuoteSource>);
    let portfolio = engine.create_portfolio("property", dec!(50)).await.unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        // Every one of these is unfillable: buys exceed cash, sells have no shares.
        let side = if rng.gen_bool(0.5) {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let order = engine
            .place_order(
                portfolio.id,
                OrderRequest::market("AAPL", side, dec!(1000)),
            )
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);
    }

    let state = engine.get_portfolio(portfolio.id).await.unwrap();
    assert_eq!(state.cash, dec!(50));
    assert!(state.positions.is_empty());
    assert!(state.executions.is_empty());
    assert_eq!(state.orders.len(), 50);
}
