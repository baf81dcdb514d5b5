use chrono::{DateTime, Utc};
use configuration::Simulation;
use core_types::{Execution, Order, OrderSide, Position, RejectReason};
use market_data::BidAsk;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// The state of one simulated brokerage account: cash, positions, and the
/// append-only order and execution logs.
///
/// Mutation happens only through `execute_market`, which enforces the
/// conservation invariants: cash never goes negative, a position's quantity
/// always equals the signed sum of its committed executions, and the average
/// price is re-averaged only on buys.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub id: Uuid,
    pub name: String,
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    pub orders: Vec<Order>,
    pub executions: Vec<Execution>,
    /// Portfolio-lifetime realized P&L. Survives flat positions being pruned
    /// from the map.
    pub realized_pnl: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(name: String, initial_cash: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            cash: initial_cash,
            positions: HashMap::new(),
            orders: Vec::new(),
            executions: Vec::new(),
            realized_pnl: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Held quantity for a symbol; zero when flat (flat entries are pruned).
    pub fn position_quantity(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Fills `order` against the quoted bid/ask, or rejects it.
    ///
    /// The fill price crosses the spread and pays slippage on top: buys lift
    /// the ask, sells hit the bid. Affordability and share coverage are
    /// re-checked here against the actual fill cost, so a committed execution
    /// can never push cash negative or a position short, regardless of what
    /// the admission-time estimate said.
    pub(crate) fn execute_market(&mut self, order: &mut Order, quote: &BidAsk, sim: &Simulation) {
        let fill_price = match order.side {
            OrderSide::Buy => quote.ask * (Decimal::ONE + sim.slippage_pct),
            OrderSide::Sell => quote.bid * (Decimal::ONE - sim.slippage_pct),
        };
        let commission = sim.commission_per_trade;

        match order.side {
            OrderSide::Buy => {
                let cost = order.quantity * fill_price + commission;
                if self.cash < cost {
                    tracing::warn!(
                        portfolio_id = %self.id,
                        order_id = %order.id,
                        symbol = %order.symbol,
                        %cost,
                        cash = %self.cash,
                        "rejecting buy: fill cost exceeds cash"
                    );
                    order.reject(RejectReason::InsufficientCash);
                    self.updated_at = Utc::now();
                    return;
                }
            }
            OrderSide::Sell => {
                if self.position_quantity(&order.symbol) < order.quantity {
                    tracing::warn!(
                        portfolio_id = %self.id,
                        order_id = %order.id,
                        symbol = %order.symbol,
                        requested = %order.quantity,
                        held = %self.position_quantity(&order.symbol),
                        "rejecting sell: not enough shares"
                    );
                    order.reject(RejectReason::InsufficientShares);
                    self.updated_at = Utc::now();
                    return;
                }
            }
        }

        let execution = Execution {
            id: Uuid::new_v4(),
            order_id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: fill_price,
            commission,
            timestamp: Utc::now(),
        };

        self.apply_execution(&execution);
        order.fill(fill_price, order.quantity, commission);
        self.executions.push(execution);

        tracing::info!(
            portfolio_id = %self.id,
            order_id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            price = %fill_price,
            "order filled"
        );
    }

    /// Applies a committed execution to cash and positions. Callers have
    /// already verified affordability and coverage.
    fn apply_execution(&mut self, execution: &Execution) {
        let notional = execution.price * execution.quantity;
        match execution.side {
            OrderSide::Buy => {
                let position = self
                    .positions
                    .entry(execution.symbol.clone())
                    .or_insert_with(|| Position::flat(execution.symbol.as_str()));
                let total_cost = position.avg_price * position.quantity + notional;
                position.quantity += execution.quantity;
                position.avg_price = total_cost / position.quantity;
                self.cash -= notional + execution.commission;
            }
            OrderSide::Sell => {
                if let Some(position) = self.positions.get_mut(&execution.symbol) {
                    let realized =
                        notional - execution.quantity * position.avg_price - execution.commission;
                    position.realized_pnl += realized;
                    self.realized_pnl += realized;
                    position.quantity -= execution.quantity;
                    if position.quantity.is_zero() {
                        self.positions.remove(&execution.symbol);
                    }
                }
                self.cash += notional - execution.commission;
            }
        }
        self.updated_at = execution.timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderRequest, OrderStatus};
    use rust_decimal_macros::dec;

    fn buy_order(portfolio: &Portfolio, symbol: &str, quantity: Decimal) -> Order {
        Order::new(
            portfolio.id,
            &OrderRequest::market(symbol, OrderSide::Buy, quantity),
        )
    }

    fn sell_order(portfolio: &Portfolio, symbol: &str, quantity: Decimal) -> Order {
        Order::new(
            portfolio.id,
            &OrderRequest::market(symbol, OrderSide::Sell, quantity),
        )
    }

    fn flat_quote(price: Decimal) -> BidAsk {
        BidAsk {
            bid: price,
            ask: price,
        }
    }

    fn no_cost_sim() -> Simulation {
        Simulation {
            commission_per_trade: Decimal::ZERO,
            slippage_pct: Decimal::ZERO,
            spread_pct: Decimal::ZERO,
        }
    }

    #[test]
    fn buy_reaverages_vwap() {
        let mut portfolio = Portfolio::new("test".into(), dec!(100000));
        let sim = no_cost_sim();

        let mut first = buy_order(&portfolio, "AAPL", dec!(10));
        portfolio.execute_market(&mut first, &flat_quote(dec!(100)), &sim);
        let mut second = buy_order(&portfolio, "AAPL", dec!(10));
        portfolio.execute_market(&mut second, &flat_quote(dec!(120)), &sim);

        let position = &portfolio.positions["AAPL"];
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_price, dec!(110));
        assert_eq!(portfolio.cash, dec!(100000) - dec!(2200));
    }

    #[test]
    fn sell_realizes_pnl_without_touching_avg_price() {
        let mut portfolio = Portfolio::new("test".into(), dec!(100000));
        let sim = no_cost_sim();

        let mut buy = buy_order(&portfolio, "AAPL", dec!(10));
        portfolio.execute_market(&mut buy, &flat_quote(dec!(100)), &sim);
        let mut sell = sell_order(&portfolio, "AAPL", dec!(4));
        portfolio.execute_market(&mut sell, &flat_quote(dec!(110)), &sim);

        let position = &portfolio.positions["AAPL"];
        assert_eq!(position.quantity, dec!(6));
        assert_eq!(position.avg_price, dec!(100));
        assert_eq!(position.realized_pnl, dec!(40));
        assert_eq!(portfolio.realized_pnl, dec!(40));
    }

    #[test]
    fn flat_position_is_pruned_and_realized_pnl_survives() {
        let mut portfolio = Portfolio::new("test".into(), dec!(100000));
        let sim = no_cost_sim();

        let mut buy = buy_order(&portfolio, "AAPL", dec!(10));
        portfolio.execute_market(&mut buy, &flat_quote(dec!(100)), &sim);
        let mut sell = sell_order(&portfolio, "AAPL", dec!(10));
        portfolio.execute_market(&mut sell, &flat_quote(dec!(105)), &sim);

        assert!(portfolio.positions.is_empty());
        assert_eq!(portfolio.realized_pnl, dec!(50));
        assert_eq!(portfolio.cash, dec!(100050));
    }

    #[test]
    fn buy_is_rejected_when_fill_cost_exceeds_cash() {
        let mut portfolio = Portfolio::new("test".into(), dec!(1000));
        let sim = no_cost_sim();

        let mut order = buy_order(&portfolio, "AAPL", dec!(11));
        portfolio.execute_market(&mut order, &flat_quote(dec!(100)), &sim);

        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.reject_reason, Some(RejectReason::InsufficientCash));
        assert_eq!(portfolio.cash, dec!(1000));
        assert!(portfolio.executions.is_empty());
    }

    #[test]
    fn slippage_and_commission_are_charged() {
        let mut portfolio = Portfolio::new("test".into(), dec!(100000));
        let sim = Simulation {
            commission_per_trade: dec!(1),
            slippage_pct: dec!(0.001),
            spread_pct: Decimal::ZERO,
        };

        let mut order = buy_order(&portfolio, "AAPL", dec!(100));
        portfolio.execute_market(&mut order, &flat_quote(dec!(100)), &sim);

        // fill = 100 * 1.001 = 100.1, cost = 100 * 100.1 + 1
        assert_eq!(order.filled_price, Some(dec!(100.100)));
        assert_eq!(portfolio.cash, dec!(100000) - dec!(10010) - dec!(1));
    }
}
