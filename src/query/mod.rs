use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

mod executor;

pub use executor::QueryExecutor;

/// Which columns a select returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    All,
    Columns(Vec<String>),
}

/// Whether the backend should report how many rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountMode {
    None,
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Equals(String, Value),
    NotEquals(String, Value),
    GreaterThan(String, Value),
    GreaterEquals(String, Value),
    LessThan(String, Value),
    LessEquals(String, Value),
    IsNull(String),
    IsNotNull(String),
}

impl Condition {
    /// Column this condition tests.
    pub fn column(&self) -> &str {
        match self {
            Condition::Equals(col, _)
            | Condition::NotEquals(col, _)
            | Condition::GreaterThan(col, _)
            | Condition::GreaterEquals(col, _)
            | Condition::LessThan(col, _)
            | Condition::LessEquals(col, _)
            | Condition::IsNull(col)
            | Condition::IsNotNull(col) => col,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// A declarative read against one remote table.
///
/// Built with chained calls, e.g.
/// `SelectQuery::from("leads").select_all().order("created_at", OrderDirection::Descending).range(0, 9)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub table: String,
    pub selection: Selection,
    pub count: CountMode,
    /// Only the count is wanted; no row bodies are returned.
    pub head: bool,
    pub conditions: Vec<Condition>,
    pub order_by: Vec<OrderBy>,
    /// Inclusive row range `(from, to)`.
    pub range: Option<(usize, usize)>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            selection: Selection::All,
            count: CountMode::None,
            head: false,
            conditions: Vec::new(),
            order_by: Vec::new(),
            range: None,
            limit: None,
        }
    }

    pub fn select_all(mut self) -> Self {
        self.selection = Selection::All;
        self
    }

    /// Adds `column` to the projection.
    pub fn select(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        match &mut self.selection {
            Selection::All => self.selection = Selection::Columns(vec![column]),
            Selection::Columns(cols) => cols.push(column),
        }
        self
    }

    pub fn count_exact(mut self) -> Self {
        self.count = CountMode::Exact;
        self
    }

    pub fn head(mut self) -> Self {
        self.head = true;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Condition::GreaterEquals(column.into(), value.into()))
    }

    pub fn not_null(self, column: impl Into<String>) -> Self {
        self.filter(Condition::IsNotNull(column.into()))
    }

    pub fn order(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.range = Some((from, to));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every column the query touches, for backend-side validation.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = Vec::new();
        if let Selection::Columns(selected) = &self.selection {
            cols.extend(selected.iter().map(String::as_str));
        }
        cols.extend(self.conditions.iter().map(Condition::column));
        cols.extend(self.order_by.iter().map(|o| o.column.as_str()));
        cols
    }
}

/// Rows and/or count returned by the backend for one `SelectQuery`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    /// Present only when the query asked for `CountMode::Exact`.
    pub count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let query = SelectQuery::from("leads")
            .select("value")
            .select("name")
            .not_null("value")
            .order("value", OrderDirection::Descending)
            .limit(5);

        assert_eq!(query.table, "leads");
        assert_eq!(
            query.selection,
            Selection::Columns(vec!["value".to_string(), "name".to_string()])
        );
        assert_eq!(query.conditions, vec![Condition::IsNotNull("value".to_string())]);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.count, CountMode::None);
        assert!(!query.head);
        assert_eq!(query.referenced_columns(), vec!["value", "name", "value", "value"]);
    }

    #[test]
    fn test_count_head() {
        let query = SelectQuery::from("leads")
            .count_exact()
            .head()
            .gte("created_at", "2024-01-01T00:00:00Z");

        assert_eq!(query.selection, Selection::All);
        assert_eq!(query.count, CountMode::Exact);
        assert!(query.head);
        assert_eq!(query.conditions[0].column(), "created_at");
    }
}
