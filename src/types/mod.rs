use crate::utils::toml_config::ConfigError;
use std::path::PathBuf;

// ============= Error Types =============

/// Errors produced by the ragline pipeline.
///
/// Only [`AppError::Generation`] is recoverable: the chat loop reports it and
/// keeps going. Everything else signals a missing input, a configuration
/// problem, or a desynchronized index/chunk store, and ends the operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether an interactive session may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Generation(_))
    }
}

impl From<ragline_vector::Error> for AppError {
    fn from(err: ragline_vector::Error) -> Self {
        match err {
            ragline_vector::Error::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
            ragline_vector::Error::Io(e) => AppError::Io(e),
            other => AppError::Index(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
