//! Query error types
//!
//! Defines the conditions under which a query description is rejected
//! before anything is sent to the service.

use thiserror::Error;

/// Errors that can occur while translating a query description
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The description names no table
    #[error("Table is missing.")]
    MissingTable,

    /// The description could not be read
    #[error("Invalid query description: {0}")]
    InvalidDescription(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QueryError::MissingTable.to_string(), "Table is missing.");

        let err = QueryError::InvalidDescription("expected value".to_string());
        assert_eq!(err.to_string(), "Invalid query description: expected value");
    }
}
