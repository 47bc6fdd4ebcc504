//! Wire messages
//!
//! Requests serialize every field; replies default missing fields, since
//! the service omits zero values. The raw result payload travels as base64.

use serde::{Deserialize, Serialize};

use super::codes::{CustomType, LoadError, LoadType, Operation, OrderType, Rollup, TimeUnit};

// ============================================
// QUERY
// ============================================

/// A single column predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: Operation,
    /// Values in string form; the service coerces them to the column type
    pub value: Vec<String>,
}

/// Predicates that must all hold
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredicateAnd {
    pub expression: Vec<Predicate>,
}

/// Predicates of which at least one must hold
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredicateOr {
    pub expression: Vec<Predicate>,
}

/// An aggregated column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub column: String,
    pub method: Rollup,
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

/// A column computed server-side from an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomColumn {
    pub column: String,
    #[serde(rename = "type")]
    pub column_type: CustomType,
    pub expr: String,
}

/// Query request sent to the service
///
/// At most one of `filter_a` / `filter_o` is set. Timeline fields are only
/// meaningful when `timeline` is true.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    pub table: String,
    /// Start, epoch seconds
    pub start: i64,
    /// End, epoch seconds
    pub end: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_a: Option<PredicateAnd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_o: Option<PredicateOr>,
    pub dimension: Vec<String>,
    pub timeline: bool,
    /// Timeline window in seconds
    pub window: u32,
    pub time_unit: TimeUnit,
    /// Timezone offset in seconds
    pub tz_offset: i32,
    pub metric: Vec<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    pub top: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<CustomColumn>,
}

/// Execution statistics attached to a query reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    /// Service error code, `0` on success
    pub error: i32,
    pub message: String,
    pub query_time_ms: u64,
    pub rows_scanned: u64,
    pub blocks_scanned: u64,
    pub rows_return: u64,
}

/// Query reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResponse {
    pub stats: Option<Statistics>,
    /// Serialized row batch, opaque to the client
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

// ============================================
// TABLES
// ============================================

/// Table listing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListTables {
    pub limit: u32,
}

/// Table listing reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableList {
    pub table: Vec<String>,
}

/// Table state request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStateRequest {
    pub table: String,
}

/// Table state reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStateResponse {
    pub block_count: u64,
    pub row_count: u64,
    pub mem_size: u64,
    pub min_time: i64,
    pub max_time: i64,
    /// Dimension column names
    pub dimension: Vec<String>,
    /// Metric column names
    pub metric: Vec<String>,
    /// Serialized column histograms
    pub hists: Vec<String>,
}

// ============================================
// LOAD
// ============================================

/// Load (or unload) request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    #[serde(rename = "type")]
    pub load_type: LoadType,
    pub table: String,
    /// Load spec as a JSON document, empty for unload
    pub json: String,
    /// Time to live in seconds
    pub ttl: u32,
}

impl LoadRequest {
    /// Request evicting `table` from the cluster
    pub fn unload(table: impl Into<String>) -> Self {
        Self {
            load_type: LoadType::Unload,
            table: table.into(),
            json: String::new(),
            ttl: 0,
        }
    }
}

/// Load reply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadResponse {
    pub error: LoadError,
    /// Table name the data was loaded as
    pub table: String,
    pub load_time_ms: u64,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
