//! Enumerations carried inside wire messages
//!
//! Each enum serializes as its upper-case protocol name. Discriminants are
//! the numeric protocol codes.

use serde::{Deserialize, Serialize};

/// Comparison applied by a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Operation {
    /// Equal to any of the values
    Eq = 0,
    /// Not equal to any of the values
    Neq = 1,
    /// Greater than
    More = 2,
    /// Less than
    Less = 3,
    /// SQL-style pattern match
    Like = 4,
    /// Case-insensitive pattern match
    Ilike = 5,
}

impl Operation {
    /// Parse from the protocol name or a common symbol
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQ" | "=" | "==" => Some(Self::Eq),
            "NEQ" | "!=" | "<>" => Some(Self::Neq),
            "MORE" | ">" => Some(Self::More),
            "LESS" | "<" => Some(Self::Less),
            "LIKE" => Some(Self::Like),
            "ILIKE" => Some(Self::Ilike),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "EQ"),
            Self::Neq => write!(f, "NEQ"),
            Self::More => write!(f, "MORE"),
            Self::Less => write!(f, "LESS"),
            Self::Like => write!(f, "LIKE"),
            Self::Ilike => write!(f, "ILIKE"),
        }
    }
}

/// Aggregation method applied to a metric column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum Rollup {
    Count = 0,
    Sum = 1,
    Min = 2,
    Max = 3,
    Avg = 4,
    /// Merge of tree-structured values (e.g. stack traces)
    Treemerge = 5,
    /// Cardinality estimate
    CardEst = 6,
    P10 = 7,
    P25 = 8,
    P50 = 9,
    P75 = 10,
    P90 = 11,
    P99 = 12,
    #[serde(rename = "P99_9")]
    P999 = 13,
    #[serde(rename = "P99_99")]
    P9999 = 14,
}

impl Rollup {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "AVG" | "AVERAGE" => Some(Self::Avg),
            "TREEMERGE" => Some(Self::Treemerge),
            "CARD_EST" | "CARDINALITY" => Some(Self::CardEst),
            "P10" => Some(Self::P10),
            "P25" => Some(Self::P25),
            "P50" | "MEDIAN" => Some(Self::P50),
            "P75" => Some(Self::P75),
            "P90" => Some(Self::P90),
            "P99" => Some(Self::P99),
            "P99_9" => Some(Self::P999),
            "P99_99" => Some(Self::P9999),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum OrderType {
    Asc = 0,
    Desc = 1,
}

impl OrderType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Value type of a server-side computed column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum CustomType {
    Int = 0,
    Long = 1,
    Float = 2,
    Double = 3,
    String = 4,
}

/// Unit used to round timeline points
///
/// The service buckets a timeline window into this calendar unit; `None`
/// keeps plain fixed-size windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum TimeUnit {
    #[default]
    None = 0,
    Hour = 1,
    Day = 2,
    Week = 3,
    Month = 4,
    Quarter = 5,
    Year = 6,
}

impl TimeUnit {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "hour" | "h" => Some(Self::Hour),
            "day" | "d" => Some(Self::Day),
            "week" | "w" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" | "q" => Some(Self::Quarter),
            "year" | "y" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Kind of load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum LoadType {
    /// Load a table declared in the cluster config
    Config = 0,
    /// Load a table on demand from a JSON spec
    Demand = 1,
    /// Load a Google Sheet as a table
    GoogleSheet = 2,
    /// Evict a loaded table
    Unload = 3,
}

/// Outcome code of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum LoadError {
    #[default]
    Success = 0,
    ParseError = 1,
    MissingParam = 2,
    TemplateNotFound = 3,
    NotSupported = 4,
}

impl LoadError {
    /// Numeric protocol code
    pub fn code(self) -> i32 {
        self as i32
    }
}
