//! RPC Channel
//!
//! The transport seam between [`NebulaClient`](super::NebulaClient) and the
//! service. A channel performs one request/reply exchange per call and owns
//! everything about the connection: addressing, timeouts, encoding. The
//! client never retries, so a channel that wants retries must do them itself.

use async_trait::async_trait;
use thiserror::Error;

use crate::wire::{
    ListTables, LoadRequest, LoadResponse, QueryRequest, QueryResponse, TableList,
    TableStateRequest, TableStateResponse,
};

/// Metadata key flagging whether a caller identity is attached
pub const AUTH_KEY: &str = "nebula-auth";
/// Metadata key carrying the caller identity
pub const USER_KEY: &str = "nebula-user";

/// Service status codes used by channels when reporting failures
pub mod codes {
    pub const UNKNOWN: i32 = 2;
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const DEADLINE_EXCEEDED: i32 = 4;
    pub const NOT_FOUND: i32 = 5;
    pub const PERMISSION_DENIED: i32 = 7;
    pub const RESOURCE_EXHAUSTED: i32 = 8;
    pub const UNIMPLEMENTED: i32 = 12;
    pub const INTERNAL: i32 = 13;
    pub const UNAVAILABLE: i32 = 14;
    pub const UNAUTHENTICATED: i32 = 16;
}

/// Caller identity, usually an email
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    user: Option<String>,
}

impl Identity {
    /// No caller identity
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Identity for `user`; an empty name is anonymous
    pub fn user(user: impl Into<String>) -> Self {
        let user = user.into();
        if user.is_empty() {
            Self::anonymous()
        } else {
            Self { user: Some(user) }
        }
    }

    /// The user name, if any
    pub fn name(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Metadata entries sent with every call
    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        match &self.user {
            Some(user) => vec![(AUTH_KEY, "1".to_string()), (USER_KEY, user.clone())],
            None => vec![(AUTH_KEY, "0".to_string())],
        }
    }
}

/// Failure reported by the channel or the service behind it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}]: {message}")]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
}

impl ServiceError {
    /// Create a new service error
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One request/reply exchange per call
///
/// `Ok(None)` means the service answered without a reply message. Unloading
/// a table is a [`load`](Channel::load) call with an unload request.
#[async_trait]
pub trait Channel: Send + Sync {
    /// List tables visible to the caller
    async fn tables(
        &self,
        request: ListTables,
        identity: &Identity,
    ) -> Result<Option<TableList>, ServiceError>;

    /// Fetch the state of one table
    async fn state(
        &self,
        request: TableStateRequest,
        identity: &Identity,
    ) -> Result<Option<TableStateResponse>, ServiceError>;

    /// Load or unload a table
    async fn load(
        &self,
        request: LoadRequest,
        identity: &Identity,
    ) -> Result<Option<LoadResponse>, ServiceError>;

    /// Run a query
    async fn query(
        &self,
        request: QueryRequest,
        identity: &Identity,
    ) -> Result<Option<QueryResponse>, ServiceError>;
}
