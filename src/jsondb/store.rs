// Remote store interface
//
// Table-per-collection access with the four operations the adapter needs.
// Rows are flat JSON objects keyed by snake_case column name.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::StoreError;

pub type Row = Map<String, Value>;

/// Rows a delete applies to
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteFilter {
    All,
    KeyIn { column: String, values: Vec<Value> },
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// One page of a table, ordered by `order_by`
    async fn select_page(
        &self,
        table: &str,
        order_by: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert rows, updating existing rows that share `conflict_key`
    async fn upsert(&self, table: &str, rows: &[Row], conflict_key: &str) -> Result<(), StoreError>;

    /// Insert rows, silently skipping those whose `conflict_key` already exists
    async fn insert_ignore_duplicates(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
    ) -> Result<(), StoreError>;

    async fn delete_where(&self, table: &str, filter: &DeleteFilter) -> Result<(), StoreError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Conflict-key value of a row rendered as a string
pub fn row_key(row: &Row, conflict_key: &str) -> String {
    match row.get(conflict_key) {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_key() {
        let row = json!({"id": "book_1", "code": 7}).as_object().cloned().unwrap();
        assert_eq!(row_key(&row, "id"), "book_1");
        assert_eq!(row_key(&row, "code"), "7");
        assert_eq!(row_key(&row, "slug"), "");
    }
}
