//! Nebula Query Translation
//!
//! Builds the wire request for a query from a loosely-typed description:
//!
//! - **AST**: Query description types and builder
//! - **Time**: Resolve time expressions into epoch seconds
//! - **Translator**: Produce the strict wire request
//!
//! # Time Expressions
//!
//! ```text
//! 1594116303000 | "1594116303000"   epoch milliseconds, rounded to seconds
//! "now"                             current time
//! "-<count><unit>"                  minutes (m, min, mins, minute, minutes)
//!                                   hours   (h, hr, hrs, hour, hours)
//!                                   days    (d, day, days)
//!                                   weeks   (w, wk, wks, week, weeks)
//! "2020-07-07 10:05:03"             calendar time in UTC
//! ```
//!
//! # Example
//!
//! ```rust
//! use nebula_client::query::{translate, QueryDescription};
//! use nebula_client::wire::{OrderType, Rollup};
//!
//! let query = QueryDescription::builder("nebula.test")
//!     .last_days(7)
//!     .key("country")
//!     .metric("age", Rollup::Avg)
//!     .sort(OrderType::Desc)
//!     .build();
//!
//! let request = translate(&query).unwrap();
//! assert_eq!(request.order.unwrap().column, "age");
//! ```

mod ast;
mod error;
mod time;
mod translator;

pub use ast::{
    CustomColumnSpec, FilterGroup, FilterLeaf, FilterNode, FilterValue, Logic, MetricSpec,
    QueryBuilder, QueryDescription, SortSpec, TimelineSpec,
};
pub use error::{QueryError, QueryResult};
pub use time::{resolve, resolve_at, unit_seconds, TimeValue};
pub use translator::{translate, translate_at};
