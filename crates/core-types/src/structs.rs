use crate::enums::{OrderSide, OrderStatus, OrderType, RejectReason};
use crate::error::OrderValidationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller-facing shape of an order before the engine accepts it.
///
/// `validate` enforces only the structural constraints (positive quantity,
/// prices present for the order type). Affordability and share coverage are
/// checked against live portfolio state by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            stop_price: None,
        }
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            stop_price: None,
        }
    }

    pub fn stop(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Stop,
            quantity,
            limit_price: None,
            stop_price: Some(stop_price),
        }
    }

    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::StopLimit,
            quantity,
            limit_price: Some(limit_price),
            stop_price: Some(stop_price),
        }
    }

    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.quantity <= Decimal::ZERO {
            return Err(OrderValidationError::NonPositiveQuantity(self.quantity));
        }
        match self.order_type {
            OrderType::Limit | OrderType::StopLimit if self.limit_price.is_none() => {
                return Err(OrderValidationError::MissingLimitPrice(self.order_type));
            }
            _ => {}
        }
        match self.order_type {
            OrderType::Stop | OrderType::StopLimit if self.stop_price.is_none() => {
                return Err(OrderValidationError::MissingStopPrice(self.order_type));
            }
            _ => {}
        }
        Ok(())
    }
}

/// An order as tracked by the engine. Requested fields are immutable after
/// creation; fill fields are set exactly once when the order resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub reject_reason: Option<RejectReason>,
    pub created_at: DateTime<Utc>,
    /// Stamped when the order reaches a terminal state (FILLED, CANCELLED or REJECTED).
    pub resolved_at: Option<DateTime<Utc>>,
    pub filled_price: Option<Decimal>,
    pub filled_quantity: Option<Decimal>,
    pub commission: Option<Decimal>,
}

impl Order {
    /// Builds a new PENDING order from a validated request.
    /// Symbols are normalized to uppercase here, at the entry point.
    pub fn new(portfolio_id: Uuid, request: &OrderRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            portfolio_id,
            symbol: request.symbol.to_uppercase(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            limit_price: request.limit_price,
            stop_price: request.stop_price,
            status: OrderStatus::Pending,
            reject_reason: None,
            created_at: Utc::now(),
            resolved_at: None,
            filled_price: None,
            filled_quantity: None,
            commission: None,
        }
    }

    pub fn fill(&mut self, price: Decimal, quantity: Decimal, commission: Decimal) {
        self.status = OrderStatus::Filled;
        self.filled_price = Some(price);
        self.filled_quantity = Some(quantity);
        self.commission = Some(commission);
        self.resolved_at = Some(Utc::now());
    }

    pub fn reject(&mut self, reason: RejectReason) {
        self.status = OrderStatus::Rejected;
        self.reject_reason = Some(reason);
        self.resolved_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
        self.resolved_at = Some(Utc::now());
    }
}

/// An immutable audit record of a quantity actually traded against one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub order_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A holding in one symbol. Market value and unrealized P&L are derived from
/// current quotes on demand and never stored on the struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    /// Volume-weighted average cost. Meaningful only while quantity is non-zero;
    /// SELL executions never change it.
    pub avg_price: Decimal,
    /// Accumulates on each sell for the lifetime of the position, never reset.
    pub realized_pnl: Decimal,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn market_value(&self, current_price: Decimal) -> Decimal {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        (current_price - self.avg_price) * self.quantity
    }
}
