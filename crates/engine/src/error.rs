use core_types::OrderValidationError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Portfolio {0} not found")]
    PortfolioNotFound(Uuid),

    #[error("Initial cash must be non-negative, got {0}")]
    InvalidInitialCash(Decimal),

    #[error("Invalid order request: {0}")]
    InvalidOrder(#[from] OrderValidationError),
}
