//! Query Translator
//!
//! Turns a [`QueryDescription`] into the strict [`QueryRequest`] the service
//! accepts:
//!
//! ```text
//! Description → Validate → Time Range → Filter → Timeline → Custom Columns → Metrics/Order → Request
//! ```
//!
//! Translation only rejects a description without a table. Everything else
//! degrades: empty lists stay empty, leaves without values are dropped and a
//! filter group whose logic is neither `AND` nor `OR` is not sent at all.

use chrono::{DateTime, Utc};

use super::ast::{CustomColumnSpec, FilterNode, Logic, MetricSpec, QueryDescription};
use super::error::{QueryError, QueryResult};
use super::time::resolve_at;
use crate::wire::{
    CustomColumn, Metric, Order, Predicate, PredicateAnd, PredicateOr, QueryRequest,
};

/// Translate a description, resolving relative times against the current clock
pub fn translate(query: &QueryDescription) -> QueryResult<QueryRequest> {
    translate_at(query, Utc::now())
}

/// Translate a description with `now` as the reference for relative times
pub fn translate_at(query: &QueryDescription, now: DateTime<Utc>) -> QueryResult<QueryRequest> {
    if query.table.is_empty() {
        return Err(QueryError::MissingTable);
    }

    let mut request = QueryRequest {
        table: query.table.clone(),
        start: resolve_at(query.start.as_ref(), now),
        end: resolve_at(query.end.as_ref(), now),
        top: query.limit,
        dimension: query.keys.clone(),
        ..Default::default()
    };

    if let Some(filter) = &query.filter {
        apply_filter(&mut request, filter);
    }

    if let Some(timeline) = &query.timeline {
        request.timeline = true;
        request.window = timeline.window;
        request.time_unit = timeline.unit;
        request.tz_offset = timeline.offset;
    }

    request.custom = query.custom_columns.iter().map(custom_column).collect();

    request.metric = query.metrics.iter().map(metric).collect();

    // Sorting applies to the primary metric only, never to a key column
    if let (Some(sort), Some(column)) = (&query.sort, query.primary_column()) {
        request.order = Some(Order {
            column: column.to_string(),
            order_type: sort.order_type,
        });
    }

    Ok(request)
}

/// Flatten the rules of a top-level group into one predicate container
fn apply_filter(request: &mut QueryRequest, filter: &FilterNode) {
    let FilterNode::Group(group) = filter else {
        return;
    };

    let predicates = flatten_rules(&group.rules);
    if predicates.is_empty() {
        return;
    }

    match &group.logic {
        Logic::And => {
            request.filter_a = Some(PredicateAnd {
                expression: predicates,
            })
        }
        Logic::Or => {
            request.filter_o = Some(PredicateOr {
                expression: predicates,
            })
        }
        Logic::Unsupported(_) => {}
    }
}

/// One predicate per leaf that carries values; nested groups are skipped
fn flatten_rules(rules: &[FilterNode]) -> Vec<Predicate> {
    rules
        .iter()
        .filter_map(|rule| match rule {
            FilterNode::Leaf(leaf) if !leaf.values.is_empty() => Some(Predicate {
                column: leaf.column.clone(),
                op: leaf.op,
                value: leaf.values.iter().map(|v| v.to_string()).collect(),
            }),
            _ => None,
        })
        .collect()
}

fn metric(spec: &MetricSpec) -> Metric {
    Metric {
        column: spec.column.clone(),
        method: spec.method,
    }
}

fn custom_column(spec: &CustomColumnSpec) -> CustomColumn {
    CustomColumn {
        column: spec.name.clone(),
        column_type: spec.column_type,
        expr: spec.expression.clone(),
    }
}
