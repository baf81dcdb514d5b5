pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, OrderStatus, OrderType, RejectReason};
pub use error::OrderValidationError;
pub use structs::{Execution, Order, OrderRequest, Position};
