//! Error types for pgtable-codegen

use thiserror::Error;

/// Result type for pgtable-codegen operations.
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Error type for pgtable-codegen operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Database error surfaced through the data-access layer.
    #[error("Data access error: {0}")]
    Access(#[from] pgtable::TableError),

    /// Validation error (e.g., a requested table the script never created).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl CodegenError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CodegenError::Validation(message.into())
    }
}
