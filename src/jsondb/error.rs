// Error types for the document store adapter

use thiserror::Error;

/// A read or write rejected by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Older deployed schema lacks a column the document writes
    #[error("column \"{column}\" does not exist on table {table}")]
    MissingColumn { table: String, column: String },

    /// Table is not deployed at all
    #[error("table {table} does not exist")]
    MissingTable { table: String },

    #[error("write to {table} timed out")]
    Timeout { table: String },

    #[error("store error on {table}: {message}")]
    Backend { table: String, message: String },

    #[error("failed to encode rows for {table}: {message}")]
    Encoding { table: String, message: String },
}

impl StoreError {
    pub fn table(&self) -> &str {
        match self {
            StoreError::MissingColumn { table, .. }
            | StoreError::MissingTable { table }
            | StoreError::Timeout { table }
            | StoreError::Backend { table, .. }
            | StoreError::Encoding { table, .. } => table,
        }
    }
}

/// Persistence stopped part-way through the declared table order
///
/// Tables in `committed_tables` hold the new state, `failed_table` and
/// `pending_tables` still hold the old one. `row_keys` are the keys of the
/// rows that were being written to the failed table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persist failed at table {failed_table} after committing [{}]: {source}", .committed_tables.join(", "))]
pub struct PersistError {
    pub failed_table: String,
    pub committed_tables: Vec<String>,
    pub pending_tables: Vec<String>,
    pub row_keys: Vec<String>,
    pub source: StoreError,
}
