//! Nebula Wire Protocol
//!
//! Request and response structures exchanged with the Nebula query service.
//! Field names and enum codes are a compatibility surface owned by the
//! service; this module only mirrors them.
//!
//! - **Codes**: enumerations carried inside messages (operators, rollups, ...)
//! - **Messages**: the request/reply structures of the five service calls

mod codes;
mod messages;

pub use codes::{CustomType, LoadError, LoadType, Operation, OrderType, Rollup, TimeUnit};
pub use messages::{
    CustomColumn, ListTables, LoadRequest, LoadResponse, Metric, Order, Predicate, PredicateAnd,
    PredicateOr, QueryRequest, QueryResponse, Statistics, TableList, TableStateRequest,
    TableStateResponse,
};
