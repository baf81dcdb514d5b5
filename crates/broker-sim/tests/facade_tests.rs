use broker_sim::{BrokerageSimulator, PlaceOrderRequest};
use configuration::Config;
use core_types::OrderStatus;
use engine::PaperTradingEngine;
use market_data::{QuoteSource, StaticQuoteSource};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

async fn setup() -> BrokerageSimulator {
    let config = Config::default();
    let quotes = Arc::new(StaticQuoteSource::new(config.simulation.spread_pct));
    quotes.set_price("AAPL", dec!(150)).await;
    let engine = Arc::new(PaperTradingEngine::new(
        config,
        quotes as Arc<dyn QuoteSource>,
    ));
    BrokerageSimulator::new(engine)
}

fn order_request(symbol: &str, side: &str, quantity: rust_decimal::Decimal) -> PlaceOrderRequest {
    PlaceOrderRequest {
        account_id: None,
        symbol: symbol.to_string(),
        side: side.to_string(),
        quantity,
        order_type: None,
        price: None,
        stop_price: None,
    }
}

#[tokio::test]
async fn authenticate_provisions_the_default_account() {
    let facade = setup().await;
    let auth = facade.authenticate("key", "secret").await.unwrap();
    assert!(auth.success);
    assert_eq!(auth.expires_in, 3600);

    let info = facade.get_account_info(None).await.unwrap();
    assert_eq!(info.portfolio_id, auth.account_id);
    assert_eq!(info.name, "Paper Trading Account");
    assert_eq!(info.cash, dec!(100000));

    // A second authentication reuses the same account.
    let again = facade.authenticate("key", "secret").await.unwrap();
    assert_eq!(again.account_id, auth.account_id);
}

#[tokio::test]
async fn place_order_round_trips_through_the_core() {
    let facade = setup().await;

    // Lower-case side and type parse fine.
    let mut request = order_request("aapl", "buy", dec!(10));
    request.order_type = Some("market".to_string());
    let response = facade.place_order(request).await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.status, Some(OrderStatus::Filled));

    let status = facade.get_order_status(response.order_id.unwrap()).await;
    assert!(status.success);
    let order = status.order.unwrap();
    assert_eq!(order.symbol, "AAPL");
    assert_eq!(order.filled_quantity, Some(dec!(10)));

    let info = facade.get_account_info(None).await.unwrap();
    assert_eq!(info.positions.len(), 1);
    assert!(info.cash < dec!(100000));
}

#[tokio::test]
async fn malformed_input_yields_failure_payloads_not_errors() {
    let facade = setup().await;

    let response = facade.place_order(order_request("AAPL", "HOLD", dec!(1))).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("HOLD"));

    let mut request = order_request("AAPL", "BUY", dec!(1));
    request.order_type = Some("ICEBERG".to_string());
    let response = facade.place_order(request).await;
    assert!(!response.success);

    // A validation failure inside the core also surfaces as success: false.
    let response = facade
        .place_order(order_request("AAPL", "BUY", dec!(0)))
        .await;
    assert!(!response.success);
    assert_eq!(response.message, "Order placement failed");
}

#[tokio::test]
async fn unknown_order_status_is_not_found() {
    let facade = setup().await;
    let status = facade.get_order_status(Uuid::new_v4()).await;
    assert!(!status.success);
    assert_eq!(status.error.as_deref(), Some("Order not found"));
}

#[tokio::test]
async fn cancel_goes_through_the_default_account() {
    let facade = setup().await;

    let mut request = order_request("AAPL", "BUY", dec!(5));
    request.order_type = Some("LIMIT".to_string());
    request.price = Some(dec!(140));
    let placed = facade.place_order(request).await;
    assert_eq!(placed.status, Some(OrderStatus::Pending));

    let cancel = facade.cancel_order(placed.order_id.unwrap(), None).await;
    assert!(cancel.success);
    assert_eq!(cancel.message, "Order cancelled successfully");

    // Cancelling again fails softly.
    let again = facade.cancel_order(placed.order_id.unwrap(), None).await;
    assert!(!again.success);
}

#[tokio::test]
async fn usage_stats_track_every_call() {
    let facade = setup().await;

    facade.authenticate("key", "secret").await.unwrap();
    facade
        .place_order(order_request("AAPL", "BUY", dec!(1)))
        .await;
    facade
        .place_order(order_request("AAPL", "BUY", dec!(1)))
        .await;
    facade.get_order_status(Uuid::new_v4()).await;

    let stats = facade.usage_stats().await;
    assert_eq!(stats.total_calls, 4);
    assert_eq!(stats.endpoint_breakdown["place_order"], 2);
    assert_eq!(stats.endpoint_breakdown["authenticate"], 1);
    assert_eq!(stats.endpoint_breakdown["get_order_status"], 1);
    assert!(stats.first_call.unwrap() <= stats.last_call.unwrap());
}
