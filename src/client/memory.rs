use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::TableClient;
use crate::error::Error;
use crate::query::{QueryExecutor, QueryResponse, SelectQuery};
use crate::types::Row;

#[derive(Debug)]
struct Failure {
    message: String,
    /// Queries still allowed through before failing.
    remaining_ok: usize,
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: BTreeSet<String>,
    rows: Vec<Row>,
}

impl MemoryTable {
    fn push(&mut self, row: Row) {
        self.columns.extend(row.columns().map(str::to_string));
        self.rows.push(row);
    }
}

/// A table store held entirely in process memory.
///
/// Behaves like a remote backend from the service's point of view: unknown
/// tables are reported as `Error::RemoteQuery`, unknown columns as
/// `Error::UnknownColumn`, and a failure can be injected to exercise error
/// paths.
#[derive(Debug, Default)]
pub struct MemoryClient {
    tables: RwLock<HashMap<String, MemoryTable>>,
    failure: Mutex<Option<Failure>>,
    log: Mutex<Vec<SelectQuery>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client from a JSON object mapping table names to arrays of rows.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let data: BTreeMap<String, Vec<Row>> = serde_json::from_str(json)?;
        let mut client = Self::new();
        {
            let tables = client.tables.get_mut();
            for (name, rows) in data {
                let table = tables.entry(name).or_default();
                for row in rows {
                    table.push(row);
                }
            }
        }
        Ok(client)
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Create (or extend) a table with the given column names.
    pub async fn create_table(&self, name: &str, columns: &[&str]) {
        let mut tables = self.tables.write().await;
        let table = tables.entry(name.to_string()).or_default();
        table.columns.extend(columns.iter().map(|c| c.to_string()));
    }

    /// Append rows, creating the table if needed. Returns the number inserted.
    pub async fn insert(&self, name: &str, rows: impl IntoIterator<Item = Row>) -> usize {
        let mut tables = self.tables.write().await;
        let table = tables.entry(name.to_string()).or_default();
        let before = table.rows.len();
        for row in rows {
            table.push(row);
        }
        table.rows.len() - before
    }

    pub async fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make every subsequent query fail with `message` until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.fail_after(0, message);
    }

    /// Let `successes` more queries through, then fail every one after.
    pub fn fail_after(&self, successes: usize, message: impl Into<String>) {
        *self.failure.lock() = Some(Failure {
            message: message.into(),
            remaining_ok: successes,
        });
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<SelectQuery> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl TableClient for MemoryClient {
    async fn select(&self, query: &SelectQuery) -> Result<QueryResponse, Error> {
        self.log.lock().push(query.clone());

        let failure = match self.failure.lock().as_mut() {
            Some(failure) if failure.remaining_ok > 0 => {
                failure.remaining_ok -= 1;
                None
            }
            Some(failure) => Some(failure.message.clone()),
            None => None,
        };
        if let Some(message) = failure {
            return Err(Error::RemoteQuery(message));
        }

        let tables = self.tables.read().await;
        let table = tables.get(&query.table).ok_or_else(|| {
            Error::RemoteQuery(format!("relation \"{}\" does not exist", query.table))
        })?;

        let response = QueryExecutor::new(&query.table, &table.columns).execute(query, &table.rows)?;
        debug!(
            table = %query.table,
            rows = response.rows.len(),
            count = ?response.count,
            "memory select"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::io::Write;

    #[tokio::test]
    async fn test_insert_and_select() -> Result<(), Error> {
        let client = MemoryClient::new();
        let inserted = client
            .insert(
                "leads",
                vec![
                    Row::new().with("id", 1).with("name", "Alice"),
                    Row::new().with("id", 2).with("name", "Bob"),
                ],
            )
            .await;
        assert_eq!(inserted, 2);

        let result = client.select(&SelectQuery::from("leads").count_exact()).await?;
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.count, Some(2));
        assert_eq!(client.queries().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let client = MemoryClient::new();
        let err = client.select(&SelectQuery::from("ghosts")).await.unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("\"ghosts\""));
    }

    #[tokio::test]
    async fn test_declared_columns_on_empty_table() -> Result<(), Error> {
        let client = MemoryClient::new();
        client.create_table("deals", &["id", "amount", "created_at"]).await;

        let result = client
            .select(&SelectQuery::from("deals").select("amount").not_null("amount"))
            .await?;
        assert!(result.rows.is_empty());

        let err = client
            .select(&SelectQuery::from("deals").select("status"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "status"));

        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failure() -> Result<(), Error> {
        let client = MemoryClient::new();
        client.insert("leads", vec![Row::new().with("id", 1)]).await;

        client.fail_with("connection reset");
        let err = client.select(&SelectQuery::from("leads")).await.unwrap_err();
        assert_eq!(err.to_string(), "Remote query error: connection reset");

        client.clear_failure();
        assert_eq!(client.select(&SelectQuery::from("leads")).await?.rows.len(), 1);

        client.fail_after(2, "timeout");
        assert!(client.select(&SelectQuery::from("leads")).await.is_ok());
        assert!(client.select(&SelectQuery::from("leads")).await.is_ok());
        assert!(client.select(&SelectQuery::from("leads")).await.is_err());
        assert!(client.select(&SelectQuery::from("leads")).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_load_json_file() -> Result<(), Error> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"leads": [{{"id": 1, "status": "new"}}, {{"id": 2, "status": null}}], "deals": []}}"#
        )?;

        let client = MemoryClient::load_json_file(file.path())?;
        assert_eq!(client.table_names().await, vec!["deals", "leads"]);

        let result = client.select(&SelectQuery::from("leads").not_null("status")).await?;
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].id(), &Value::Int(1));

        Ok(())
    }
}
