//! Query Description
//!
//! The caller-facing description of an analytical query. It is loosely
//! typed on purpose: time bounds accept several notations and the filter is
//! a small tree. [`translate`](crate::query::translate) turns it into a
//! strict [`QueryRequest`](crate::wire::QueryRequest).
//!
//! # Example
//!
//! ```rust
//! use nebula_client::query::{FilterNode, QueryDescription};
//! use nebula_client::wire::{Operation, OrderType, Rollup};
//!
//! let query = QueryDescription::builder("nebula.test")
//!     .start("-7d")
//!     .end("now")
//!     .key("country")
//!     .metric("age", Rollup::Avg)
//!     .filter(FilterNode::and(vec![
//!         FilterNode::leaf("gender", Operation::Eq, vec!["F".into()]),
//!     ]))
//!     .sort(OrderType::Desc)
//!     .limit(10)
//!     .build();
//!
//! assert_eq!(query.metrics[0].column, "age");
//! ```

use serde::{de, Deserialize, Deserializer, Serialize};

use super::error::{QueryError, QueryResult};
use super::time::TimeValue;
use crate::wire::{CustomType, Operation, OrderType, Rollup, TimeUnit};

/// A query as described by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryDescription {
    /// Table to query, required
    pub table: String,
    pub start: Option<TimeValue>,
    pub end: Option<TimeValue>,
    /// Grouping columns, in group-by order
    pub keys: Vec<String>,
    /// Aggregations; the first one is the primary metric
    pub metrics: Vec<MetricSpec>,
    pub filter: Option<FilterNode>,
    /// Present for timeline (windowed) queries
    pub timeline: Option<TimelineSpec>,
    /// Sort direction for the primary metric
    pub sort: Option<SortSpec>,
    /// Maximum rows returned; `0` means zero rows
    pub limit: u32,
    /// Columns computed server-side
    #[serde(alias = "columns")]
    pub custom_columns: Vec<CustomColumnSpec>,
}

impl QueryDescription {
    /// Start building a query against `table`
    pub fn builder(table: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(table)
    }

    /// Parse a description from its JSON form
    pub fn from_json(json: &str) -> QueryResult<Self> {
        serde_json::from_str(json).map_err(|e| QueryError::InvalidDescription(e.to_string()))
    }

    /// The primary metric column, if any metric names one
    pub fn primary_column(&self) -> Option<&str> {
        self.metrics
            .iter()
            .map(|m| m.column.as_str())
            .find(|c| !c.is_empty())
    }
}

/// An aggregated column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub column: String,
    #[serde(alias = "aggregationMethod")]
    pub method: Rollup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl MetricSpec {
    /// Create a new metric
    pub fn new(column: impl Into<String>, method: Rollup) -> Self {
        Self {
            column: column.into(),
            method,
            alias: None,
        }
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Get the display name (alias or column name)
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

/// Logical operator of a filter group
///
/// Only the exact strings `AND` and `OR` are supported. Anything else is
/// kept verbatim and the group it labels is not sent. A null or missing
/// label reads as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Logic {
    And,
    Or,
    Unsupported(String),
}

impl Default for Logic {
    fn default() -> Self {
        Self::Unsupported(String::new())
    }
}

impl From<String> for Logic {
    fn from(s: String) -> Self {
        match s.as_str() {
            "AND" => Self::And,
            "OR" => Self::Or,
            _ => Self::Unsupported(s),
        }
    }
}

impl From<Option<String>> for Logic {
    fn from(s: Option<String>) -> Self {
        s.map(Self::from).unwrap_or_default()
    }
}

impl From<&str> for Logic {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Logic> for String {
    fn from(logic: Logic) -> Self {
        logic.to_string()
    }
}

impl std::fmt::Display for Logic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Unsupported(s) => write!(f, "{}", s),
        }
    }
}

/// A node of the filter tree
///
/// Only one level is meaningful: a group whose children are leaves. Groups
/// nested inside a group are accepted structurally but carry no predicates.
///
/// When reading JSON, an object with a `column` or an operator is a leaf and
/// anything else is a group. Missing or null `logic`, `rules` and `values`
/// are read as empty, so such filters translate to nothing instead of
/// failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Leaf(FilterLeaf),
}

impl FilterNode {
    /// A group of rules that must all hold
    pub fn and(rules: Vec<FilterNode>) -> Self {
        Self::group(Logic::And, rules)
    }

    /// A group of rules of which one must hold
    pub fn or(rules: Vec<FilterNode>) -> Self {
        Self::group(Logic::Or, rules)
    }

    /// A group with an arbitrary logic label
    pub fn group(logic: impl Into<Logic>, rules: Vec<FilterNode>) -> Self {
        Self::Group(FilterGroup {
            logic: logic.into(),
            rules,
        })
    }

    /// A single column predicate
    pub fn leaf(column: impl Into<String>, op: Operation, values: Vec<FilterValue>) -> Self {
        Self::Leaf(FilterLeaf {
            column: column.into(),
            op,
            values,
        })
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawFilterNode::deserialize(deserializer)?;

        if raw.column.is_none() && raw.op.is_none() {
            return Ok(Self::Group(FilterGroup {
                logic: raw.logic,
                rules: raw.rules,
            }));
        }

        let column = raw.column.unwrap_or_default();
        let op = raw.op.ok_or_else(|| {
            <D::Error as de::Error>::custom(format!(
                "filter rule on column {:?} has no operator",
                column
            ))
        })?;
        Ok(Self::Leaf(FilterLeaf {
            column,
            op,
            values: raw.values,
        }))
    }
}

/// Every field a filter node may carry, before deciding its kind
#[derive(Deserialize)]
struct RawFilterNode {
    #[serde(default)]
    logic: Logic,
    #[serde(default, deserialize_with = "null_as_empty")]
    rules: Vec<FilterNode>,
    #[serde(default)]
    column: Option<String>,
    #[serde(default, alias = "operator")]
    op: Option<Operation>,
    #[serde(default, deserialize_with = "null_as_empty")]
    values: Vec<FilterValue>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Filter group node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub logic: Logic,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<FilterNode>,
}

/// Filter leaf node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLeaf {
    pub column: String,
    #[serde(alias = "operator")]
    pub op: Operation,
    /// Leaves without values are dropped during translation
    #[serde(default, deserialize_with = "null_as_empty")]
    pub values: Vec<FilterValue>,
}

/// Scalar compared against a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Timeline bucketing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSpec {
    /// Window size in seconds
    pub window: u32,
    /// Calendar unit to round time points into
    #[serde(default)]
    pub unit: TimeUnit,
    /// Timezone offset in seconds
    #[serde(default)]
    pub offset: i32,
}

impl TimelineSpec {
    /// Fixed windows of `window` seconds
    pub fn new(window: u32) -> Self {
        Self {
            window,
            unit: TimeUnit::None,
            offset: 0,
        }
    }

    /// Round time points into `unit`
    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Shift buckets by a timezone offset in seconds
    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }
}

/// Sort directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

/// A column computed server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: CustomType,
    #[serde(alias = "expr")]
    pub expression: String,
}

impl CustomColumnSpec {
    /// Create a new custom column
    pub fn new(name: impl Into<String>, column_type: CustomType, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type,
            expression: expression.into(),
        }
    }
}

/// Builder for constructing query descriptions programmatically
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: QueryDescription,
}

impl QueryBuilder {
    /// Create a new builder for `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            query: QueryDescription {
                table: table.into(),
                ..Default::default()
            },
        }
    }

    /// Set the start of the time range
    pub fn start(mut self, start: impl Into<TimeValue>) -> Self {
        self.query.start = Some(start.into());
        self
    }

    /// Set the end of the time range
    pub fn end(mut self, end: impl Into<TimeValue>) -> Self {
        self.query.end = Some(end.into());
        self
    }

    /// Query the last N days up to now
    pub fn last_days(self, days: u32) -> Self {
        self.start(format!("-{}d", days)).end("now")
    }

    /// Add a grouping column
    pub fn key(mut self, column: impl Into<String>) -> Self {
        self.query.keys.push(column.into());
        self
    }

    /// Add an aggregated column
    pub fn metric(self, column: impl Into<String>, method: Rollup) -> Self {
        self.metric_spec(MetricSpec::new(column, method))
    }

    /// Add a fully specified metric
    pub fn metric_spec(mut self, metric: MetricSpec) -> Self {
        self.query.metrics.push(metric);
        self
    }

    /// Set the filter tree
    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Bucket results into time windows
    pub fn timeline(mut self, timeline: TimelineSpec) -> Self {
        self.query.timeline = Some(timeline);
        self
    }

    /// Sort by the primary metric
    pub fn sort(mut self, order_type: OrderType) -> Self {
        self.query.sort = Some(SortSpec { order_type });
        self
    }

    /// Set a limit on results
    pub fn limit(mut self, n: u32) -> Self {
        self.query.limit = n;
        self
    }

    /// Add a server-side computed column
    pub fn custom_column(mut self, column: CustomColumnSpec) -> Self {
        self.query.custom_columns.push(column);
        self
    }

    /// Build the description
    pub fn build(self) -> QueryDescription {
        self.query
    }
}
