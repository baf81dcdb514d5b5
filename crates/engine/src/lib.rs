//! # Paper Trading Engine
//!
//! The simulated brokerage order-execution core. It is the sole mutator of
//! portfolio state: callers place orders against it, the engine validates them
//! against the quote source, executes market orders immediately with realistic
//! spread and slippage costs, queues conditional orders, and re-evaluates the
//! queue on each market tick.
//!
//! ## Architectural Principles
//!
//! - **One lock per portfolio:** the engine keeps a map of portfolio handles,
//!   each behind its own `Mutex`. Operations on different portfolios run fully
//!   in parallel; operations on the same portfolio are strictly serialized,
//!   which is what preserves the cash/position invariants.
//! - **No I/O under a lock:** every quote lookup is awaited before the
//!   per-portfolio lock is taken, and is bounded by a timeout. A timed-out or
//!   failed lookup is indistinguishable from "no market data".
//! - **Rejection is not an error:** an unfillable order (insufficient cash or
//!   shares, no market data) is returned as a REJECTED order through normal
//!   control flow; `Err` is reserved for malformed requests and unknown ids.

use configuration::Config;
use core_types::{Order, OrderRequest, OrderSide, OrderStatus, OrderType, RejectReason};
use futures::future::join_all;
use market_data::{BidAsk, QuoteSource};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub mod error;
pub mod portfolio;
pub mod summary;

// Re-export the key components to provide a clean, public-facing API.
pub use error::EngineError;
pub use portfolio::Portfolio;
pub use summary::{PortfolioSummary, PositionSummary};

type PortfolioHandle = Arc<Mutex<Portfolio>>;

/// The core engine. Construct one explicitly per process (or per test) and
/// share it via `Arc`; there is no implicit global instance.
pub struct PaperTradingEngine {
    config: Config,
    quote_source: Arc<dyn QuoteSource>,
    portfolios: RwLock<HashMap<Uuid, PortfolioHandle>>,
}

impl PaperTradingEngine {
    pub fn new(config: Config, quote_source: Arc<dyn QuoteSource>) -> Self {
        Self {
            config,
            quote_source,
            portfolios: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates a new, empty portfolio and returns a snapshot of it.
    pub async fn create_portfolio(
        &self,
        name: &str,
        initial_cash: Decimal,
    ) -> Result<Portfolio, EngineError> {
        if initial_cash.is_sign_negative() {
            return Err(EngineError::InvalidInitialCash(initial_cash));
        }
        let portfolio = Portfolio::new(name.to_string(), initial_cash);
        let snapshot = portfolio.clone();
        self.portfolios
            .write()
            .await
            .insert(portfolio.id, Arc::new(Mutex::new(portfolio)));
        tracing::info!(portfolio_id = %snapshot.id, name, %initial_cash, "portfolio created");
        Ok(snapshot)
    }

    /// Places an order against a portfolio.
    ///
    /// A malformed request or unknown portfolio id is an `Err`. A request that
    /// is well-formed but unfillable (insufficient cash or shares, no market
    /// data) succeeds and returns the order in REJECTED state, so callers can
    /// tell "the call failed" apart from "the order did not trade".
    ///
    /// Valid market orders fill immediately; valid conditional orders are
    /// queued PENDING without reserving cash or shares (they are re-validated
    /// when their trigger fires).
    pub async fn place_order(
        &self,
        portfolio_id: Uuid,
        request: OrderRequest,
    ) -> Result<Order, EngineError> {
        request.validate()?;
        let handle = self.portfolio_handle(portfolio_id).await?;
        let mut order = Order::new(portfolio_id, &request);

        // Quote lookups happen before the portfolio lock is taken.
        let last_price = self.quote_price(&order.symbol).await;
        let quote = if order.order_type == OrderType::Market && last_price.is_some() {
            self.quote_bid_ask(&order.symbol).await
        } else {
            None
        };

        let mut portfolio = handle.lock().await;

        let Some(last_price) = last_price else {
            order.reject(RejectReason::NoMarketData);
            return Ok(Self::record(&mut portfolio, order));
        };

        // Admission check against the last price; market fills re-check the
        // actual spread-adjusted cost before committing.
        match order.side {
            OrderSide::Buy => {
                let required = order.quantity
                    * last_price
                    * (Decimal::ONE + self.config.simulation.slippage_pct)
                    + self.config.simulation.commission_per_trade;
                if portfolio.cash < required {
                    tracing::warn!(
                        portfolio_id = %portfolio.id,
                        symbol = %order.symbol,
                        %required,
                        cash = %portfolio.cash,
                        "rejecting buy at admission: insufficient cash"
                    );
                    order.reject(RejectReason::InsufficientCash);
                    return Ok(Self::record(&mut portfolio, order));
                }
            }
            OrderSide::Sell => {
                if portfolio.position_quantity(&order.symbol) < order.quantity {
                    tracing::warn!(
                        portfolio_id = %portfolio.id,
                        symbol = %order.symbol,
                        requested = %order.quantity,
                        "rejecting sell at admission: insufficient shares"
                    );
                    order.reject(RejectReason::InsufficientShares);
                    return Ok(Self::record(&mut portfolio, order));
                }
            }
        }

        if order.order_type == OrderType::Market {
            match quote {
                Some(quote) => {
                    portfolio.execute_market(&mut order, &quote, &self.config.simulation)
                }
                None => order.reject(RejectReason::NoMarketData),
            }
        } else {
            tracing::debug!(
                portfolio_id = %portfolio.id,
                order_id = %order.id,
                order_type = %order.order_type,
                symbol = %order.symbol,
                "conditional order queued"
            );
        }

        Ok(Self::record(&mut portfolio, order))
    }

    /// Cancels a PENDING order. Returns `Ok(true)` on success, `Ok(false)` for
    /// unknown order ids and orders in any other state; idempotent by design.
    pub async fn cancel_order(
        &self,
        portfolio_id: Uuid,
        order_id: Uuid,
    ) -> Result<bool, EngineError> {
        let handle = self.portfolio_handle(portfolio_id).await?;
        let mut portfolio = handle.lock().await;

        let mut cancelled = false;
        if let Some(order) = portfolio.orders.iter_mut().find(|o| o.id == order_id) {
            if order.status == OrderStatus::Pending {
                order.cancel();
                cancelled = true;
            }
        }
        if cancelled {
            portfolio.updated_at = chrono::Utc::now();
            tracing::info!(%portfolio_id, %order_id, "order cancelled");
        }
        Ok(cancelled)
    }

    /// Re-evaluates every PENDING order against current prices.
    ///
    /// Portfolios are processed concurrently; within one portfolio, orders are
    /// processed strictly in creation order so queue position stays
    /// predictable. Triggered orders are re-validated and then executed as
    /// market orders under the original order id. Returns a snapshot of every
    /// order that left PENDING during the tick.
    pub async fn process_market_tick(&self) -> Vec<Order> {
        let handles: Vec<PortfolioHandle> =
            self.portfolios.read().await.values().cloned().collect();
        let results = join_all(handles.into_iter().map(|h| self.tick_portfolio(h))).await;
        results.into_iter().flatten().collect()
    }

    /// Returns a snapshot of a portfolio's full state.
    pub async fn get_portfolio(&self, portfolio_id: Uuid) -> Result<Portfolio, EngineError> {
        let handle = self.portfolio_handle(portfolio_id).await?;
        let portfolio = handle.lock().await;
        Ok(portfolio.clone())
    }

    pub async fn portfolio_ids(&self) -> Vec<Uuid> {
        self.portfolios.read().await.keys().copied().collect()
    }

    /// Searches all portfolios for an order by id.
    pub async fn find_order(&self, order_id: Uuid) -> Option<Order> {
        let handles: Vec<PortfolioHandle> =
            self.portfolios.read().await.values().cloned().collect();
        for handle in handles {
            let portfolio = handle.lock().await;
            if let Some(order) = portfolio.orders.iter().find(|o| o.id == order_id) {
                return Some(order.clone());
            }
        }
        None
    }

    /// Builds the reporting view of a portfolio from a state snapshot and
    /// freshly fetched prices. Side-effect-free aside from the quote lookups.
    pub async fn get_portfolio_summary(
        &self,
        portfolio_id: Uuid,
    ) -> Result<PortfolioSummary, EngineError> {
        let handle = self.portfolio_handle(portfolio_id).await?;
        let snapshot = handle.lock().await.clone();

        let mut prices = HashMap::new();
        for symbol in snapshot.positions.keys() {
            if let Some(price) = self.quote_price(symbol).await {
                prices.insert(symbol.clone(), price);
            }
        }

        Ok(summary::build_summary(
            &snapshot,
            &prices,
            self.config.reporting.recent_executions,
        ))
    }

    /// Appends the order to the portfolio log exactly once and returns a snapshot.
    fn record(portfolio: &mut Portfolio, order: Order) -> Order {
        portfolio.orders.push(order.clone());
        portfolio.updated_at = chrono::Utc::now();
        order
    }

    async fn portfolio_handle(&self, portfolio_id: Uuid) -> Result<PortfolioHandle, EngineError> {
        self.portfolios
            .read()
            .await
            .get(&portfolio_id)
            .cloned()
            .ok_or(EngineError::PortfolioNotFound(portfolio_id))
    }

    async fn tick_portfolio(&self, handle: PortfolioHandle) -> Vec<Order> {
        // Collect the symbols with pending orders under a short lock, then
        // fetch quotes with the lock released.
        let symbols: HashSet<String> = {
            let portfolio = handle.lock().await;
            portfolio
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .map(|o| o.symbol.clone())
                .collect()
        };
        if symbols.is_empty() {
            return Vec::new();
        }

        let mut prices: HashMap<String, Decimal> = HashMap::new();
        let mut quotes: HashMap<String, BidAsk> = HashMap::new();
        for symbol in &symbols {
            if let Some(price) = self.quote_price(symbol).await {
                prices.insert(symbol.clone(), price);
                if let Some(quote) = self.quote_bid_ask(symbol).await {
                    quotes.insert(symbol.clone(), quote);
                }
            }
        }

        let mut portfolio = handle.lock().await;
        let pending: Vec<usize> = portfolio
            .orders
            .iter()
            .enumerate()
            .filter(|(_, o)| o.status == OrderStatus::Pending)
            .map(|(i, _)| i)
            .collect();

        let mut transitioned = Vec::new();
        for index in pending {
            let mut order = portfolio.orders[index].clone();
            // A symbol without a quote stays queued until data returns.
            let Some(&current_price) = prices.get(&order.symbol) else {
                continue;
            };

            // A stop-limit arms into a plain limit order once its stop
            // trigger fires; the limit rule is evaluated from this tick on.
            if order.order_type == OrderType::StopLimit {
                let armed = order.stop_price.is_some_and(|stop| match order.side {
                    OrderSide::Buy => current_price >= stop,
                    OrderSide::Sell => current_price <= stop,
                });
                if !armed {
                    continue;
                }
                order.order_type = OrderType::Limit;
                order.stop_price = None;
                portfolio.orders[index] = order.clone();
                tracing::debug!(order_id = %order.id, symbol = %order.symbol, "stop-limit armed");
            }

            if !trigger_met(&order, current_price) {
                continue;
            }

            // Validate-on-trigger: nothing was reserved at placement time, so
            // the fill path re-checks affordability and coverage now and
            // rejects instead of overdrawing.
            match quotes.get(&order.symbol) {
                Some(quote) => {
                    portfolio.execute_market(&mut order, quote, &self.config.simulation)
                }
                None => order.reject(RejectReason::NoMarketData),
            }
            portfolio.orders[index] = order.clone();
            portfolio.updated_at = chrono::Utc::now();
            transitioned.push(order);
        }
        transitioned
    }

    async fn quote_price(&self, symbol: &str) -> Option<Decimal> {
        let timeout = Duration::from_millis(self.config.market_data.quote_timeout_ms);
        match tokio::time::timeout(timeout, self.quote_source.current_price(symbol)).await {
            Ok(Ok(price)) => Some(price),
            Ok(Err(e)) => {
                tracing::warn!(symbol, error = %e, "quote source returned no price");
                None
            }
            Err(_) => {
                tracing::warn!(symbol, "quote lookup timed out");
                None
            }
        }
    }

    async fn quote_bid_ask(&self, symbol: &str) -> Option<BidAsk> {
        let timeout = Duration::from_millis(self.config.market_data.quote_timeout_ms);
        match tokio::time::timeout(timeout, self.quote_source.bid_ask(symbol)).await {
            Ok(Ok(quote)) => Some(quote),
            Ok(Err(e)) => {
                tracing::warn!(symbol, error = %e, "quote source returned no bid/ask");
                None
            }
            Err(_) => {
                tracing::warn!(symbol, "bid/ask lookup timed out");
                None
            }
        }
    }
}

/// Whether a queued conditional order's trigger condition is met at the
/// current price. Market orders never reach this point.
fn trigger_met(order: &Order, current_price: Decimal) -> bool {
    match (order.order_type, order.side) {
        (OrderType::Limit, OrderSide::Buy) => {
            order.limit_price.is_some_and(|limit| current_price <= limit)
        }
        (OrderType::Limit, OrderSide::Sell) => {
            order.limit_price.is_some_and(|limit| current_price >= limit)
        }
        (OrderType::Stop, OrderSide::Buy) => {
            order.stop_price.is_some_and(|stop| current_price >= stop)
        }
        (OrderType::Stop, OrderSide::Sell) => {
            order.stop_price.is_some_and(|stop| current_price <= stop)
        }
        _ => false,
    }
}
