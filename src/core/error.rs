use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("No collector capacity available for this planning run")]
    NoCapacityAvailable,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl AppError {
    /// Structural state-machine violation, regardless of actor.
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
