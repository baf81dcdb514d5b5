//! # Brokerage-Facade Simulator
//!
//! A thin adapter exposing broker-style verbs over the paper trading core, for
//! integration testing of upstream code against a realistic broker shape. It
//! translates external request payloads into core calls without changing any
//! of the core's semantics, auto-provisions a default account on first use,
//! and records every call for usage statistics.

use chrono::{DateTime, Utc};
use core_types::{OrderRequest, OrderSide, OrderType};
use engine::{EngineError, PaperTradingEngine, PortfolioSummary};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub mod messages;

pub use messages::{
    AuthResponse, CancelResponse, OrderStatusResponse, PlaceOrderRequest, PlaceOrderResponse,
    UsageStats,
};

const DEFAULT_ACCOUNT_NAME: &str = "Paper Trading Account";

#[derive(Debug, Clone)]
struct ApiCall {
    endpoint: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct FacadeState {
    default_account: Option<Uuid>,
    api_calls: Vec<ApiCall>,
}

pub struct BrokerageSimulator {
    engine: Arc<PaperTradingEngine>,
    state: Mutex<FacadeState>,
}

impl BrokerageSimulator {
    pub fn new(engine: Arc<PaperTradingEngine>) -> Self {
        Self {
            engine,
            state: Mutex::new(FacadeState::default()),
        }
    }

    /// Simulated authentication. Any credentials are accepted; the returned
    /// account id is the default portfolio, provisioned on first use.
    pub async fn authenticate(
        &self,
        _api_key: &str,
        _secret: &str,
    ) -> Result<AuthResponse, EngineError> {
        self.record_call("authenticate").await;
        let account_id = self.ensure_default_account().await?;
        Ok(AuthResponse {
            success: true,
            access_token: "paper_access_token".to_string(),
            expires_in: 3600,
            account_id,
        })
    }

    /// Account snapshot in the core's summary shape.
    pub async fn get_account_info(
        &self,
        account_id: Option<Uuid>,
    ) -> Result<PortfolioSummary, EngineError> {
        self.record_call("get_account_info").await;
        let account_id = match account_id {
            Some(id) => id,
            None => self.ensure_default_account().await?,
        };
        self.engine.get_portfolio_summary(account_id).await
    }

    /// Places an order. Malformed input and engine errors both surface as
    /// `success: false` payloads; this boundary never propagates an error.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> PlaceOrderResponse {
        self.record_call("place_order").await;

        let Some(side) = parse_side(&request.side) else {
            return PlaceOrderResponse::failure(format!("Unknown order side: {}", request.side));
        };
        let order_type = match request.order_type.as_deref() {
            None => OrderType::Market,
            Some(raw) => match parse_order_type(raw) {
                Some(t) => t,
                None => {
                    return PlaceOrderResponse::failure(format!("Unknown order type: {raw}"));
                }
            },
        };

        let account_id = match request.account_id {
            Some(id) => id,
            None => match self.ensure_default_account().await {
                Ok(id) => id,
                Err(e) => return PlaceOrderResponse::failure(e.to_string()),
            },
        };

        let core_request = OrderRequest {
            symbol: request.symbol,
            side,
            order_type,
            quantity: request.quantity,
            limit_price: request.price,
            stop_price: request.stop_price,
        };

        match self.engine.place_order(account_id, core_request).await {
            Ok(order) => PlaceOrderResponse {
                success: true,
                order_id: Some(order.id),
                status: Some(order.status),
                error: None,
                message: "Order placed successfully".to_string(),
            },
            Err(e) => PlaceOrderResponse::failure(e.to_string()),
        }
    }

    /// Full order record, searched across all portfolios.
    pub async fn get_order_status(&self, order_id: Uuid) -> OrderStatusResponse {
        self.record_call("get_order_status").await;
        match self.engine.find_order(order_id).await {
            Some(order) => OrderStatusResponse {
                success: true,
                order: Some(order),
                error: None,
            },
            None => OrderStatusResponse {
                success: false,
                order: None,
                error: Some("Order not found".to_string()),
            },
        }
    }

    pub async fn cancel_order(&self, order_id: Uuid, account_id: Option<Uuid>) -> CancelResponse {
        self.record_call("cancel_order").await;
        let account_id = match account_id {
            Some(id) => Some(id),
            None => self.state.lock().await.default_account,
        };

        let cancelled = match account_id {
            Some(id) => self
                .engine
                .cancel_order(id, order_id)
                .await
                .unwrap_or(false),
            None => false,
        };

        CancelResponse {
            success: cancelled,
            message: if cancelled {
                "Order cancelled successfully".to_string()
            } else {
                "Order cancellation failed".to_string()
            },
        }
    }

    /// Aggregates the call-audit log into usage statistics.
    pub async fn usage_stats(&self) -> UsageStats {
        let state = self.state.lock().await;
        let mut endpoint_breakdown: HashMap<String, usize> = HashMap::new();
        for call in &state.api_calls {
            *endpoint_breakdown.entry(call.endpoint.to_string()).or_insert(0) += 1;
        }
        UsageStats {
            total_calls: state.api_calls.len(),
            endpoint_breakdown,
            first_call: state.api_calls.first().map(|c| c.timestamp),
            last_call: state.api_calls.last().map(|c| c.timestamp),
        }
    }

    async fn record_call(&self, endpoint: &'static str) {
        let mut state = self.state.lock().await;
        state.api_calls.push(ApiCall {
            endpoint,
            timestamp: Utc::now(),
        });
        tracing::debug!(endpoint, "facade call recorded");
    }

    async fn ensure_default_account(&self) -> Result<Uuid, EngineError> {
        let mut state = self.state.lock().await;
        if let Some(id) = state.default_account {
            return Ok(id);
        }
        let portfolio = self
            .engine
            .create_portfolio(DEFAULT_ACCOUNT_NAME, dec!(100000))
            .await?;
        state.default_account = Some(portfolio.id);
        tracing::info!(account_id = %portfolio.id, "default paper account provisioned");
        Ok(portfolio.id)
    }
}

fn parse_side(raw: &str) -> Option<OrderSide> {
    match raw.to_ascii_uppercase().as_str() {
        "BUY" => Some(OrderSide::Buy),
        "SELL" => Some(OrderSide::Sell),
        _ => None,
    }
}

fn parse_order_type(raw: &str) -> Option<OrderType> {
    match raw.to_ascii_uppercase().as_str() {
        "MARKET" => Some(OrderType::Market),
        "LIMIT" => Some(OrderType::Limit),
        "STOP" => Some(OrderType::Stop),
        "STOP_LIMIT" => Some(OrderType::StopLimit),
        _ => None,
    }
}
