use crate::enums::OrderType;
use rust_decimal::Decimal;
use thiserror::Error;

/// A malformed order request. This is a programming error at the call site,
/// surfaced as an `Err`, unlike a rejected order which is a trading outcome.
#[derive(Error, Debug)]
pub enum OrderValidationError {
    #[error("Order quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("{0} orders require a limit price")]
    MissingLimitPrice(OrderType),

    #[error("{0} orders require a stop price")]
    MissingStopPrice(OrderType),
}
