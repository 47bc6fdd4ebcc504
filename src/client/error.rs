//! Client error types

use thiserror::Error;

use super::channel::ServiceError;
use crate::query::QueryError;

/// Errors surfaced by [`NebulaClient`](super::NebulaClient) calls
///
/// None of these are retried by the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected before any call was made
    #[error("{0}")]
    Validation(#[from] QueryError),

    /// The service answered, but without a required part of the reply
    #[error("{0}")]
    Protocol(String),

    /// The channel reported a failure
    #[error("[{code}]: {message}")]
    Transport { code: i32, message: String },

    /// The channel could not be created
    #[error("Channel setup failed: {0}")]
    Setup(String),
}

impl From<ServiceError> for ClientError {
    fn from(err: ServiceError) -> Self {
        ClientError::Transport {
            code: err.code,
            message: err.message,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
