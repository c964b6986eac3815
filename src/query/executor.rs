use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::query::{Condition, CountMode, OrderBy, OrderDirection, QueryResponse, SelectQuery, Selection};
use crate::types::{Row, Value};

/// Evaluates a `SelectQuery` against rows held in memory.
///
/// Pipeline: filter, order, count, range, limit, project.
pub struct QueryExecutor<'a> {
    table: &'a str,
    columns: &'a BTreeSet<String>,
}

impl<'a> QueryExecutor<'a> {
    /// `columns` is the set of column names the table is known to have.
    pub fn new(table: &'a str, columns: &'a BTreeSet<String>) -> Self {
        Self { table, columns }
    }

    /// Execute a query over `rows`
    pub fn execute(&self, query: &SelectQuery, rows: &[Row]) -> Result<QueryResponse, Error> {
        self.validate_columns(query)?;

        let matched: Vec<&Row> = rows
            .iter()
            .filter(|row| Self::evaluate_conditions(&query.conditions, row))
            .collect();

        let matched = Self::sort_results(matched, &query.order_by);

        let count = match query.count {
            CountMode::Exact => Some(matched.len() as u64),
            CountMode::None => None,
        };

        if query.head {
            return Ok(QueryResponse {
                rows: Vec::new(),
                count,
            });
        }

        let windowed = Self::apply_range_limit(matched, query.range, query.limit);
        let rows = windowed
            .into_iter()
            .map(|row| Self::project_row(row, &query.selection))
            .collect();

        Ok(QueryResponse { rows, count })
    }

    // Helper methods

    fn validate_columns(&self, query: &SelectQuery) -> Result<(), Error> {
        for column in query.referenced_columns() {
            if column != "*" && !self.columns.contains(column) {
                return Err(Error::UnknownColumn {
                    table: self.table.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    fn evaluate_conditions(conditions: &[Condition], row: &Row) -> bool {
        conditions.iter().all(|condition| Self::evaluate_condition(condition, row))
    }

    fn evaluate_condition(condition: &Condition, row: &Row) -> bool {
        let row_val = row.get(condition.column());

        // Comparisons never match a null cell.
        let compare = |val: &Value, accept: fn(Ordering) -> bool| {
            if row_val.is_null() || val.is_null() {
                return false;
            }
            row_val.partial_cmp(val).is_some_and(accept)
        };

        match condition {
            Condition::Equals(_, val) => compare(val, Ordering::is_eq),
            Condition::NotEquals(_, val) => compare(val, Ordering::is_ne),
            Condition::GreaterThan(_, val) => compare(val, Ordering::is_gt),
            Condition::GreaterEquals(_, val) => compare(val, Ordering::is_ge),
            Condition::LessThan(_, val) => compare(val, Ordering::is_lt),
            Condition::LessEquals(_, val) => compare(val, Ordering::is_le),
            Condition::IsNull(_) => row_val.is_null(),
            Condition::IsNotNull(_) => !row_val.is_null(),
        }
    }

    /// Stable multi-key sort on `Value::sort_cmp`. Nulls come first ascending
    /// and last descending.
    fn sort_results<'r>(mut results: Vec<&'r Row>, order_by: &[OrderBy]) -> Vec<&'r Row> {
        if order_by.is_empty() {
            return results;
        }

        results.sort_by(|a, b| {
            for order in order_by {
                let cmp = a.get(&order.column).sort_cmp(b.get(&order.column));

                if cmp != Ordering::Equal {
                    return match order.direction {
                        OrderDirection::Ascending => cmp,
                        OrderDirection::Descending => cmp.reverse(),
                    };
                }
            }
            Ordering::Equal
        });

        results
    }

    /// Apply the inclusive range, then the limit
    fn apply_range_limit<'r>(
        results: Vec<&'r Row>,
        range: Option<(usize, usize)>,
        limit: Option<usize>,
    ) -> Vec<&'r Row> {
        let (start, take) = match range {
            Some((from, to)) if to >= from => (from, to - from + 1),
            Some((from, _)) => (from, 0),
            None => (0, usize::MAX),
        };
        let take = limit.map_or(take, |l| l.min(take));
        results.into_iter().skip(start).take(take).collect()
    }

    fn project_row(row: &Row, selection: &Selection) -> Row {
        match selection {
            Selection::All => row.clone(),
            Selection::Columns(cols) if cols.iter().any(|c| c == "*") => row.clone(),
            Selection::Columns(cols) => row.project(cols),
        }
    }
}
