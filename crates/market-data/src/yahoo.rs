use crate::error::MarketDataError;
use crate::{synthetic_bid_ask, BidAsk, QuoteSource};
use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// A live quote source backed by the public Yahoo Finance chart endpoint.
///
/// Yahoo quotes a single regular-market price; the bid/ask pair is synthesized
/// with the configured spread, the same way the static source does it.
pub struct YahooQuoteSource {
    client: reqwest::Client,
    base_url: String,
    spread_pct: Decimal,
}

impl YahooQuoteSource {
    pub fn new(spread_pct: Decimal) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, spread_pct)
    }

    /// Points the source at an alternative host, e.g. a local fixture server.
    pub fn with_base_url(base_url: impl Into<String>, spread_pct: Decimal) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            spread_pct,
        }
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        let symbol = symbol.to_uppercase();
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            tracing::warn!(%symbol, status = %response.status(), "quote request rejected upstream");
            return Err(MarketDataError::Unavailable(symbol));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::Deserialization(e.to_string()))?;

        let price = body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.meta.regular_market_price)
            .ok_or_else(|| MarketDataError::Unavailable(symbol.clone()))?;

        Decimal::from_f64(price).ok_or_else(|| {
            MarketDataError::Deserialization(format!(
                "price {price} for {symbol} is not representable as a decimal"
            ))
        })
    }

    async fn bid_ask(&self, symbol: &str) -> Result<BidAsk, MarketDataError> {
        let last = self.current_price(symbol).await?;
        Ok(synthetic_bid_ask(last, self.spread_pct))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}
