use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the paper trading service.
/// Every field carries a serde default so a missing or empty `config.toml`
/// yields a fully usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub market_data: MarketData,
    #[serde(default)]
    pub reporting: Reporting,
}

/// Parameters of the simulated execution cost model.
#[derive(Debug, Clone, Deserialize)]
pub struct Simulation {
    /// Flat commission charged per executed trade. Paper trading defaults to zero.
    #[serde(default = "default_commission")]
    pub commission_per_trade: Decimal,

    /// The assumed adverse price movement for market orders, applied on top of
    /// the quoted bid/ask. 0.001 corresponds to 0.1%.
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: Decimal,

    /// The synthetic bid/ask spread as a fraction of the last price, used by
    /// quote sources that only observe a single last price. 0.001 means the
    /// bid and ask each sit half of 0.1% away from last.
    #[serde(default = "default_spread_pct")]
    pub spread_pct: Decimal,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            commission_per_trade: default_commission(),
            slippage_pct: default_slippage_pct(),
            spread_pct: default_spread_pct(),
        }
    }
}

/// Parameters governing quote source calls made by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    /// Upper bound on any single quote lookup. An elapsed timer is treated
    /// exactly like "no market data" and never leaves an order waiting.
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
}

impl Default for MarketData {
    fn default() -> Self {
        Self {
            quote_timeout_ms: default_quote_timeout_ms(),
        }
    }
}

/// Parameters of the portfolio summary view.
#[derive(Debug, Clone, Deserialize)]
pub struct Reporting {
    /// How many of the most recent executions a summary includes.
    #[serde(default = "default_recent_executions")]
    pub recent_executions: usize,
}

impl Default for Reporting {
    fn default() -> Self {
        Self {
            recent_executions: default_recent_executions(),
        }
    }
}

fn default_commission() -> Decimal {
    Decimal::ZERO
}

fn default_slippage_pct() -> Decimal {
    dec!(0.001)
}

fn default_spread_pct() -> Decimal {
    dec!(0.001)
}

fn default_quote_timeout_ms() -> u64 {
    2000
}

fn default_recent_executions() -> usize {
    10
}
