//! Reply reshaping
//!
//! Flattens service replies into the shapes handed back to callers. Nothing
//! is computed here and the query payload is passed through untouched.

use serde::Serialize;

use super::error::{ClientError, ClientResult};
use crate::wire::{QueryResponse, TableStateResponse};

pub(crate) const NULL_RESPONSE: &str = "[nebula]: null/undefined response";
pub(crate) const INVALID_STATS: &str = "[nebula]: invalid query result stats";

/// Query outcome with execution counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimplifiedResponse {
    /// Service error code, `0` on success
    pub error: i32,
    pub duration_ms: u64,
    pub rows_scanned: u64,
    pub blocks_scanned: u64,
    pub rows_returned: u64,
    /// Serialized row batch, decoded by the caller
    pub data: Vec<u8>,
}

/// Reshape a query reply, failing when the reply or its statistics are absent
pub fn reshape(reply: Option<QueryResponse>) -> ClientResult<SimplifiedResponse> {
    let reply = reply.ok_or_else(|| ClientError::Protocol(NULL_RESPONSE.to_string()))?;
    let stats = reply
        .stats
        .ok_or_else(|| ClientError::Protocol(INVALID_STATS.to_string()))?;

    Ok(SimplifiedResponse {
        error: stats.error,
        duration_ms: stats.query_time_ms,
        rows_scanned: stats.rows_scanned,
        blocks_scanned: stats.blocks_scanned,
        rows_returned: stats.rows_return,
        data: reply.data,
    })
}

/// Loaded state of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableState {
    pub table_name: String,
    pub block_count: u64,
    pub row_count: u64,
    pub memory_size: u64,
    pub min_time: i64,
    pub max_time: i64,
    /// Dimension columns
    pub column_keys: Vec<String>,
    /// Metric columns
    pub column_values: Vec<String>,
    pub hists: Vec<String>,
}

impl TableState {
    /// Build from a state reply for `table`
    pub fn from_reply(table: &str, reply: TableStateResponse) -> Self {
        Self {
            table_name: table.to_string(),
            block_count: reply.block_count,
            row_count: reply.row_count,
            memory_size: reply.mem_size,
            min_time: reply.min_time,
            max_time: reply.max_time,
            column_keys: reply.dimension,
            column_values: reply.metric,
            hists: reply.hists,
        }
    }
}
