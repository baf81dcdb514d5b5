//! # Quote Source Seam
//!
//! This crate defines the `QuoteSource` trait, the injectable capability the
//! trading engine consumes for market prices. The engine must behave correctly
//! against any implementation: the deterministic in-memory `StaticQuoteSource`
//! used by tests and replay harnesses, or the live `YahooQuoteSource`.
//!
//! Quote sources that only observe a last price synthesize a bid/ask pair from
//! a configurable spread; the spread math lives here so every implementation
//! quotes identically.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod static_source;
pub mod yahoo;

// Re-export the key components to provide a clean, public-facing API.
pub use error::MarketDataError;
pub use static_source::StaticQuoteSource;
pub use yahoo::YahooQuoteSource;

/// A bid/ask pair quoted by the market: bid is the price we sell to, ask the
/// price we buy from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidAsk {
    pub bid: Decimal,
    pub ask: Decimal,
}

/// The abstract interface for market prices.
///
/// Any error is "unavailable" to the caller; retry policy, if any, belongs to
/// the implementation, never to the consuming engine.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// The last traded price for a symbol.
    async fn current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError>;

    /// The current bid/ask pair for a symbol.
    async fn bid_ask(&self, symbol: &str) -> Result<BidAsk, MarketDataError>;
}

/// Synthesizes a bid/ask pair around a last price: each side sits half the
/// configured spread away.
pub fn synthetic_bid_ask(last_price: Decimal, spread_pct: Decimal) -> BidAsk {
    let half_spread = last_price * spread_pct / dec!(2);
    BidAsk {
        bid: last_price - half_spread,
        ask: last_price + half_spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_spread_is_symmetric_around_last() {
        let quote = synthetic_bid_ask(dec!(100), dec!(0.001));
        assert_eq!(quote.bid, dec!(99.95));
        assert_eq!(quote.ask, dec!(100.05));
        assert_eq!(quote.ask - quote.bid, dec!(0.10));
    }

    #[test]
    fn zero_spread_collapses_to_last() {
        let quote = synthetic_bid_ask(dec!(42), Decimal::ZERO);
        assert_eq!(quote.bid, dec!(42));
        assert_eq!(quote.ask, dec!(42));
    }
}
