//! Error types for pgtable

use thiserror::Error;

/// Result type alias for pgtable operations
pub type TableResult<T> = Result<T, TableError>;

/// Error types for single-table data access
#[derive(Debug, Error)]
pub enum TableError {
    /// A caller-supplied argument violated a precondition.
    ///
    /// Raised before any statement is issued.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-row query matched an unexpected number of rows.
    #[error("Row count violation: expected {expected} row(s), got {got}")]
    RowCount { expected: u64, got: u64 },

    /// The underlying connection failed; the original error is preserved.
    #[error("Data access error: {0}")]
    DataAccess(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl TableError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a row-count violation error
    pub fn row_count(expected: u64, got: u64) -> Self {
        Self::RowCount { expected, got }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is an invalid-argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a row-count violation
    pub fn is_row_count(&self) -> bool {
        matches!(self, Self::RowCount { .. })
    }

    /// Check if this is a wrapped connection failure
    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::DataAccess(_))
    }
}
