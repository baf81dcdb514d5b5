use crate::portfolio::Portfolio;
use chrono::{DateTime, Utc};
use core_types::{Execution, Order, OrderStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A point-in-time view of one portfolio, serializable for reporting layers.
///
/// Positions whose quote is unavailable report `null` market fields and are
/// excluded from the totals rather than polluting them with stale numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub portfolio_id: Uuid,
    pub name: String,
    pub cash: Decimal,
    pub total_value: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub positions: Vec<PositionSummary>,
    pub pending_orders: Vec<Order>,
    pub recent_executions: Vec<Execution>,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub current_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub unrealized_pnl_pct: Option<Decimal>,
}

/// Builds the summary from a portfolio snapshot and prefetched prices.
/// Pure function of its inputs; stored state is never touched.
pub(crate) fn build_summary(
    portfolio: &Portfolio,
    prices: &HashMap<String, Decimal>,
    recent_executions: usize,
) -> PortfolioSummary {
    let mut total_value = portfolio.cash;
    let mut total_unrealized_pnl = Decimal::ZERO;

    let mut positions: Vec<PositionSummary> = portfolio
        .positions
        .values()
        .map(|position| {
            let current_price = prices.get(&position.symbol).copied();
            let market_value = current_price.map(|price| position.market_value(price));
            let unrealized_pnl = current_price.map(|price| position.unrealized_pnl(price));

            if let Some(value) = market_value {
                total_value += value;
            }
            if let Some(pnl) = unrealized_pnl {
                total_unrealized_pnl += pnl;
            }

            let cost_basis = position.avg_price * position.quantity.abs();
            let unrealized_pnl_pct = match unrealized_pnl {
                Some(pnl) if !cost_basis.is_zero() => Some(pnl / cost_basis * dec!(100)),
                _ => None,
            };

            PositionSummary {
                symbol: position.symbol.clone(),
                quantity: position.quantity,
                avg_price: position.avg_price,
                current_price,
                market_value,
                unrealized_pnl,
                unrealized_pnl_pct,
            }
        })
        .collect();
    positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let commissions: Decimal = portfolio.executions.iter().map(|e| e.commission).sum();

    let pending_orders = portfolio
        .orders
        .iter()
        .filter(|order| order.status == OrderStatus::Pending)
        .cloned()
        .collect();

    let recent_executions = portfolio
        .executions
        .iter()
        .rev()
        .take(recent_executions)
        .rev()
        .cloned()
        .collect();

    PortfolioSummary {
        portfolio_id: portfolio.id,
        name: portfolio.name.clone(),
        cash: portfolio.cash,
        total_value,
        total_unrealized_pnl,
        total_realized_pnl: portfolio.realized_pnl + commissions,
        positions,
        pending_orders,
        recent_executions,
        as_of: Utc::now(),
    }
}
