//! # Rebalancing-Plan Executor
//!
//! Translates a phased batch of externally computed trade recommendations into
//! individual order placements against the paper trading core. The batch is
//! best-effort: each failed trade becomes an error entry, the rest of the plan
//! keeps going, and partial execution is an expected outcome rather than a
//! fatal one.

use core_types::{OrderRequest, OrderSide, OrderStatus, OrderType};
use engine::{PaperTradingEngine, PortfolioSummary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::PlanError;

/// One trade the external planner recommends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecommendation {
    pub symbol: String,
    pub action: OrderSide,
    /// Share delta; the executor trades its absolute value.
    pub shares: Decimal,
    /// The planner's price snapshot, used as the limit for deferred phases.
    pub reference_price: Decimal,
}

/// A plan grouped into execution phases. `immediate` trades go out as market
/// orders; `end_of_day` trades as limit orders at the reference price (the
/// planner's "wait for a better window" simplified to "limit at today's
/// price"); `next_session` trades are reported back untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebalancingPlan {
    #[serde(default)]
    pub immediate: Vec<TradeRecommendation>,
    #[serde(default)]
    pub end_of_day: Vec<TradeRecommendation>,
    #[serde(default)]
    pub next_session: Vec<TradeRecommendation>,
}

/// The order record a plan execution reports for each placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub symbol: String,
    pub action: OrderSide,
    pub quantity: Decimal,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeError {
    pub symbol: String,
    pub error: String,
}

/// The outcome of one plan execution. `success` is true only when no trade
/// failed; everything that was placed is visible regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExecutionResult {
    pub success: bool,
    pub orders_placed: Vec<PlacedOrder>,
    pub errors: Vec<TradeError>,
    /// Next-session recommendations, reported so nothing is silently dropped.
    pub deferred: Vec<TradeRecommendation>,
    pub summary: PortfolioSummary,
}

pub struct PlanExecutor {
    engine: Arc<PaperTradingEngine>,
}

impl PlanExecutor {
    pub fn new(engine: Arc<PaperTradingEngine>) -> Self {
        Self { engine }
    }

    /// Executes a plan against one portfolio. `Err` only for an unknown
    /// portfolio; per-trade failures land in the result's error list.
    pub async fn execute_plan(
        &self,
        portfolio_id: Uuid,
        plan: &RebalancingPlan,
    ) -> Result<PlanExecutionResult, PlanError> {
        self.engine
            .get_portfolio(portfolio_id)
            .await
            .map_err(|_| PlanError::PortfolioNotFound(portfolio_id))?;

        let mut orders_placed = Vec::new();
        let mut errors = Vec::new();

        for recommendation in &plan.immediate {
            self.place_trade(
                portfolio_id,
                recommendation,
                OrderType::Market,
                &mut orders_placed,
                &mut errors,
            )
            .await;
        }
        for recommendation in &plan.end_of_day {
            self.place_trade(
                portfolio_id,
                recommendation,
                OrderType::Limit,
                &mut orders_placed,
                &mut errors,
            )
            .await;
        }

        let summary = self.engine.get_portfolio_summary(portfolio_id).await?;
        let success = errors.is_empty();
        tracing::info!(
            %portfolio_id,
            placed = orders_placed.len(),
            failed = errors.len(),
            deferred = plan.next_session.len(),
            success,
            "rebalancing plan executed"
        );

        Ok(PlanExecutionResult {
            success,
            orders_placed,
            errors,
            deferred: plan.next_session.clone(),
            summary,
        })
    }

    async fn place_trade(
        &self,
        portfolio_id: Uuid,
        recommendation: &TradeRecommendation,
        order_type: OrderType,
        orders_placed: &mut Vec<PlacedOrder>,
        errors: &mut Vec<TradeError>,
    ) {
        let quantity = recommendation.shares.abs();
        if quantity.is_zero() {
            return;
        }

        let request = match order_type {
            OrderType::Limit => OrderRequest::limit(
                recommendation.symbol.clone(),
                recommendation.action,
                quantity,
                recommendation.reference_price,
            ),
            _ => OrderRequest::market(
                recommendation.symbol.clone(),
                recommendation.action,
                quantity,
            ),
        };

        match self.engine.place_order(portfolio_id, request).await {
            Ok(order) => {
                // A rejected order is both a visible placement and a batch error.
                if order.status == OrderStatus::Rejected {
                    let reason = order
                        .reject_reason
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "rejected".to_string());
                    errors.push(TradeError {
                        symbol: order.symbol.clone(),
                        error: reason,
                    });
                }
                orders_placed.push(PlacedOrder {
                    order_id: order.id,
                    symbol: order.symbol,
                    action: order.side,
                    quantity: order.quantity,
                    order_type: order.order_type,
                    limit_price: order.limit_price,
                    status: order.status,
                });
            }
            Err(error) => {
                tracing::warn!(
                    symbol = %recommendation.symbol,
                    %error,
                    "plan trade failed to place"
                );
                errors.push(TradeError {
                    symbol: recommendation.symbol.to_uppercase(),
                    error: error.to_string(),
                });
            }
        }
    }
}
