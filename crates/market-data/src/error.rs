use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("No market data available for symbol: {0}")]
    Unavailable(String),

    #[error("Quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to deserialize quote response: {0}")]
    Deserialization(String),
}
