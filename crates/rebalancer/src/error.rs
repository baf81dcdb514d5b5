use engine::EngineError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Portfolio {0} not found")]
    PortfolioNotFound(Uuid),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
