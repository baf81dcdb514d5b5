use chrono::{DateTime, Utc};
use core_types::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Result of `authenticate`. Always succeeds in the simulation; the account id
/// points at the auto-provisioned default portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub access_token: String,
    pub expires_in: u64,
    pub account_id: Uuid,
}

/// Broker-style order placement request. `side` and `order_type` arrive as
/// free-form strings from external callers and are parsed case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub symbol: String,
    pub side: String,
    pub quantity: Decimal,
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,
    /// Limit price for LIMIT / STOP_LIMIT orders.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl PlaceOrderResponse {
    pub(crate) fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            status: None,
            error: Some(error.into()),
            message: "Order placement failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

/// API usage statistics aggregated from the call-audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_calls: usize,
    pub endpoint_breakdown: HashMap<String, usize>,
    pub first_call: Option<DateTime<Utc>>,
    pub last_call: Option<DateTime<Utc>>,
}
