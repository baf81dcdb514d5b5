use crate::error::MarketDataError;
use crate::{synthetic_bid_ask, BidAsk, QuoteSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A deterministic in-memory quote source.
///
/// Tests and replay harnesses set prices explicitly and drive the engine
/// through exact, reproducible market states. Removing a price models a data
/// outage for that symbol.
pub struct StaticQuoteSource {
    prices: RwLock<HashMap<String, Decimal>>,
    spread_pct: Decimal,
}

impl StaticQuoteSource {
    pub fn new(spread_pct: Decimal) -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
            spread_pct,
        }
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices
            .write()
            .await
            .insert(symbol.to_uppercase(), price);
    }

    /// Removes the symbol, simulating a feed outage.
    pub async fn clear_price(&self, symbol: &str) {
        self.prices.write().await.remove(&symbol.to_uppercase());
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        self.prices
            .read()
            .await
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| MarketDataError::Unavailable(symbol.to_string()))
    }

    async fn bid_ask(&self, symbol: &str) -> Result<BidAsk, MarketDataError> {
        let last = self.current_price(symbol).await?;
        Ok(synthetic_bid_ask(last, self.spread_pct))
    }
}
