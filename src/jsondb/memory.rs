// In-process remote store
//
// Holds tables as row lists behind a tokio RwLock. Tables can be declared
// with a fixed column set (an older deployed schema), marked missing, or
// made to fail on write. Used for local development and the transaction
// tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tokio::sync::RwLock;

use super::error::StoreError;
use super::mapping::encode_database;
use super::store::{row_key, DeleteFilter, RemoteStore, Row};
use crate::document::Database;

#[derive(Default)]
struct Tables {
    rows: BTreeMap<String, Vec<Row>>,
    columns: HashMap<String, BTreeSet<String>>,
    missing: HashSet<String>,
    failing: HashSet<String>,
    writes: u64,
}

impl Tables {
    fn check_exists(&self, table: &str) -> Result<(), StoreError> {
        if self.missing.contains(table) {
            return Err(StoreError::MissingTable { table: table.to_string() });
        }
        Ok(())
    }

    fn check_writable(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        self.check_exists(table)?;
        if self.failing.contains(table) {
            return Err(StoreError::Backend {
                table: table.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        if let Some(declared) = self.columns.get(table) {
            let unknown = rows
                .iter()
                .flat_map(|row| row.keys())
                .filter(|column| !declared.contains(column.as_str()))
                .min();
            if let Some(column) = unknown {
                return Err(StoreError::MissingColumn {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the rows of a document
    pub fn seeded(db: &Database) -> Result<Self, StoreError> {
        let mut store = Self::new();
        let tables = store.inner.get_mut();
        for (name, rows) in encode_database(db)? {
            tables.rows.insert(name.to_string(), rows);
        }
        Ok(store)
    }

    /// Restrict a table to a fixed column set
    pub fn with_columns(mut self, table: &str, columns: &[&str]) -> Self {
        let declared = columns.iter().map(|column| column.to_string()).collect();
        self.inner.get_mut().columns.insert(table.to_string(), declared);
        self
    }

    /// Simulate a table that was never deployed
    pub fn without_table(mut self, table: &str) -> Self {
        let tables = self.inner.get_mut();
        tables.rows.remove(table);
        tables.missing.insert(table.to_string());
        self
    }

    /// Make every subsequent write to `table` fail
    pub async fn fail_writes_to(&self, table: &str) {
        self.inner.write().await.failing.insert(table.to_string());
    }

    /// Number of successful write calls so far
    pub async fn write_count(&self) -> u64 {
        self.inner.read().await.writes
    }

    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.inner.read().await.rows.get(table).cloned().unwrap_or_default()
    }
}

fn sort_value(row: &Row, column: &str) -> String {
    row_key(row, column)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select_page(
        &self,
        table: &str,
        order_by: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        let tables = self.inner.read().await;
        tables.check_exists(table)?;

        let mut rows: Vec<&Row> = tables.rows.get(table).map(|rows| rows.iter().collect()).unwrap_or_default();
        rows.sort_by_key(|row| sort_value(row, order_by));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn upsert(&self, table: &str, rows: &[Row], conflict_key: &str) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        tables.check_writable(table, rows)?;

        let existing = tables.rows.entry(table.to_string()).or_default();
        for row in rows {
            let key = row_key(row, conflict_key);
            match existing.iter_mut().find(|current| row_key(current, conflict_key) == key) {
                Some(current) => {
                    for (column, value) in row {
                        current.insert(column.clone(), value.clone());
                    }
                }
                None => existing.push(row.clone()),
            }
        }
        tables.writes += 1;
        Ok(())
    }

    async fn insert_ignore_duplicates(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        tables.check_writable(table, rows)?;

        let existing = tables.rows.entry(table.to_string()).or_default();
        for row in rows {
            let key = row_key(row, conflict_key);
            if !existing.iter().any(|current| row_key(current, conflict_key) == key) {
                existing.push(row.clone());
            }
        }
        tables.writes += 1;
        Ok(())
    }

    async fn delete_where(&self, table: &str, filter: &DeleteFilter) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        tables.check_writable(table, &[])?;

        if let Some(existing) = tables.rows.get_mut(table) {
            match filter {
                DeleteFilter::All => existing.clear(),
                DeleteFilter::KeyIn { column, values } => {
                    let doomed: HashSet<String> = values
                        .iter()
                        .map(|value| match value {
                            Value::String(key) => key.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    existing.retain(|row| !doomed.contains(&row_key(row, column)));
                }
            }
        }
        tables.writes += 1;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
