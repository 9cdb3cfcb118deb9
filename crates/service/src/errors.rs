use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("entity resolver error: {0}")]
    Resolver(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn storage(err: impl std::fmt::Display) -> Self { Self::Storage(err.to_string()) }

    /// Input was rejected before any mutation was attempted.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ServiceError::Validation(_) | ServiceError::Model(_))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Model(_) => 1002,
            ServiceError::Storage(_) => 1200,
            ServiceError::Resolver(_) => 1300,
        }
    }
}
