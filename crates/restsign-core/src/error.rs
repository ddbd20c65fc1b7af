//! Error types for the RestSign core.

/// Core error type for RestSign infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum RestSignError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for RestSign operations.
pub type RestSignResult<T> = Result<T, RestSignError>;
