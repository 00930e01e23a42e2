// Postgres remote store
//
// Rows travel as JSON: selects use `to_jsonb(t)`, writes expand a JSON array
// with `jsonb_populate_recordset` so one statement serves every table.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::Duration;

use super::error::StoreError;
use super::store::{row_key, DeleteFilter, RemoteStore, Row};

const UNDEFINED_COLUMN: &str = "42703";
const UNDEFINED_TABLE: &str = "42P01";

/// Creates and configures a PostgreSQL connection pool
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn write(&self, table: &str, rows: &[Row], conflict_key: &str, update: bool) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let columns: BTreeSet<&str> = rows.iter().flat_map(|row| row.keys().map(String::as_str)).collect();
        let sql = write_statement(table, &columns, conflict_key, update);
        let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());

        sqlx::query(&sql)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(table, err))?;
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn write_statement(table: &str, columns: &BTreeSet<&str>, conflict_key: &str, update: bool) -> String {
    let table = quote_ident(table);
    let column_list = columns.iter().map(|column| quote_ident(column)).collect::<Vec<_>>().join(", ");
    let updates: Vec<String> = columns
        .iter()
        .filter(|column| **column != conflict_key)
        .map(|column| format!("{0} = EXCLUDED.{0}", quote_ident(column)))
        .collect();

    let on_conflict = if update && !updates.is_empty() {
        format!("DO UPDATE SET {}", updates.join(", "))
    } else {
        "DO NOTHING".to_string()
    };

    format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_recordset(NULL::{table}, $1) \
         ON CONFLICT ({key}) {on_conflict}",
        table = table,
        columns = column_list,
        key = quote_ident(conflict_key),
        on_conflict = on_conflict,
    )
}

fn missing_column_name(message: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"column "([^"]+)""#).ok())
        .as_ref()?
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str().to_string())
}

fn map_sqlx_error(table: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNDEFINED_COLUMN) => {
                if let Some(column) = missing_column_name(db_err.message()) {
                    return StoreError::MissingColumn { table: table.to_string(), column };
                }
            }
            Some(UNDEFINED_TABLE) => return StoreError::MissingTable { table: table.to_string() },
            _ => {}
        }
    }
    StoreError::Backend { table: table.to_string(), message: err.to_string() }
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn select_page(
        &self,
        table: &str,
        order_by: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.{} LIMIT $1 OFFSET $2",
            quote_ident(table),
            quote_ident(order_by)
        );
        let values: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| map_sqlx_error(table, err))?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Encoding {
                    table: table.to_string(),
                    message: format!("expected a row object, got {}", other),
                }),
            })
            .collect()
    }

    async fn upsert(&self, table: &str, rows: &[Row], conflict_key: &str) -> Result<(), StoreError> {
        self.write(table, rows, conflict_key, true).await
    }

    async fn insert_ignore_duplicates(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
    ) -> Result<(), StoreError> {
        self.write(table, rows, conflict_key, false).await
    }

    async fn delete_where(&self, table: &str, filter: &DeleteFilter) -> Result<(), StoreError> {
        let result = match filter {
            DeleteFilter::All => sqlx::query(&format!("DELETE FROM {}", quote_ident(table))).execute(&self.pool).await,
            DeleteFilter::KeyIn { column, values } => {
                let keys: Vec<String> = values
                    .iter()
                    .map(|value| {
                        let mut row = Row::new();
                        row.insert(column.clone(), value.clone());
                        row_key(&row, column)
                    })
                    .collect();
                let sql = format!("DELETE FROM {} WHERE {}::text = ANY($1)", quote_ident(table), quote_ident(column));
                sqlx::query(&sql).bind(keys).execute(&self.pool).await
            }
        };
        result.map_err(|err| map_sqlx_error(table, err))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
