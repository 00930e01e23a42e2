// Document store adapter
//
// Loads the whole document from the relational store, lets a caller mutate
// a private copy, re-validates it and writes the differences back table by
// table in the declared order.

pub mod backup;
pub mod error;
pub mod mapping;
pub mod memory;
pub mod metrics;
pub mod postgres;
pub mod store;
pub mod sync;
pub mod tables;

#[cfg(test)]
mod tests;

pub use error::{PersistError, StoreError};
pub use memory::MemoryStore;
pub use metrics::{MetricsSummary, StoreMetrics};
pub use postgres::{create_pool, PgStore};
pub use store::{DeleteFilter, RemoteStore, Row};

use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::business_rules::apply_operational_rules;
use crate::document::{validate_document, Database};
use crate::error::AppError;
use backup::{is_analytics_label, BackupThrottle};
use mapping::{decode_database, encode_database, TableSet};
use metrics::MutationOutcome;
use store::row_key;
use tables::{TableSpec, WriteMode, PERSIST_ORDER};

const DEFAULT_LABEL: &str = "mutation";

#[derive(Debug, Clone)]
pub struct JsonDbOptions {
    /// Rows per select page when loading a table
    pub page_size: usize,
    /// Per-table write timeout
    pub write_timeout: Option<Duration>,
    /// Minimum time between backups for one label; `None` disables backups
    pub backup_interval: Option<Duration>,
    /// Hold a process-wide lock across each read-modify-write
    pub serialize_writes: bool,
    pub slow_mutation: Duration,
}

impl Default for JsonDbOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            write_timeout: None,
            backup_interval: Some(Duration::from_secs(300)),
            serialize_writes: false,
            slow_mutation: Duration::from_millis(500),
        }
    }
}

/// Writes one table needs to reach the new state
#[derive(Debug, Clone, PartialEq)]
enum TablePlan {
    Upsert { rows: Vec<Row>, removed: Vec<Value> },
    Append { rows: Vec<Row> },
    Replace { rows: Vec<Row> },
}

impl TablePlan {
    fn row_keys(&self, spec: &TableSpec) -> Vec<String> {
        match self {
            TablePlan::Upsert { rows, removed } => rows
                .iter()
                .map(|row| row_key(row, spec.conflict_key))
                .chain(removed.iter().map(|value| match value {
                    Value::String(key) => key.clone(),
                    other => other.to_string(),
                }))
                .collect(),
            TablePlan::Append { rows } | TablePlan::Replace { rows } => {
                rows.iter().map(|row| row_key(row, spec.conflict_key)).collect()
            }
        }
    }
}

/// Diff one table's old and new rows; `None` when nothing needs writing
fn plan_table(spec: &TableSpec, old_rows: &[Row], new_rows: Vec<Row>) -> Option<TablePlan> {
    let old_by_key: HashMap<String, &Row> = old_rows
        .iter()
        .map(|row| (row_key(row, spec.conflict_key), row))
        .collect();

    match spec.mode {
        WriteMode::Upsert => {
            let new_keys: BTreeSet<String> = new_rows.iter().map(|row| row_key(row, spec.conflict_key)).collect();
            let removed: Vec<Value> = old_rows
                .iter()
                .filter(|row| !new_keys.contains(&row_key(row, spec.conflict_key)))
                .filter_map(|row| row.get(spec.conflict_key).cloned())
                .collect();
            let rows: Vec<Row> = new_rows
                .into_iter()
                .filter(|row| old_by_key.get(&row_key(row, spec.conflict_key)) != Some(&row))
                .collect();
            if rows.is_empty() && removed.is_empty() {
                None
            } else {
                Some(TablePlan::Upsert { rows, removed })
            }
        }
        WriteMode::AppendOnly => {
            let rows: Vec<Row> = new_rows
                .into_iter()
                .filter(|row| !old_by_key.contains_key(&row_key(row, spec.conflict_key)))
                .collect();
            (!rows.is_empty()).then_some(TablePlan::Append { rows })
        }
        WriteMode::ReplaceAll => {
            if new_rows.is_empty() || new_rows.as_slice() == old_rows {
                None
            } else {
                Some(TablePlan::Replace { rows: new_rows })
            }
        }
    }
}

fn encoding_failure(source: StoreError) -> PersistError {
    PersistError {
        failed_table: source.table().to_string(),
        committed_tables: Vec::new(),
        pending_tables: Vec::new(),
        row_keys: Vec::new(),
        source,
    }
}

pub struct JsonDb {
    store: Arc<dyn RemoteStore>,
    options: JsonDbOptions,
    backups: BackupThrottle,
    metrics: StoreMetrics,
    write_lock: Option<Mutex<()>>,
}

impl JsonDb {
    pub fn new(store: Arc<dyn RemoteStore>, options: JsonDbOptions) -> Self {
        tracing::info!(
            backend = store.backend_name(),
            serialize_writes = options.serialize_writes,
            "document store ready"
        );
        Self {
            backups: BackupThrottle::new(options.backup_interval.filter(|interval| !interval.is_zero())),
            metrics: StoreMetrics::with_slow_threshold(options.slow_mutation),
            write_lock: options.serialize_writes.then(|| Mutex::new(())),
            store,
            options,
        }
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Snapshot read of the full, validated document
    pub async fn read_data(&self) -> Result<Database, AppError> {
        let result = self.load().await;
        self.metrics.record_read(result.is_ok());
        result
    }

    /// Load, mutate, validate and persist the document
    ///
    /// The mutator works on a private copy. Any error from the mutator, the
    /// operational rules or schema validation aborts with nothing written.
    /// Only a failure while writing tables can leave partial state, reported
    /// as [`AppError::Persist`].
    pub async fn mutate_data<F>(&self, label: Option<&str>, mutator: F) -> Result<Database, AppError>
    where
        F: FnOnce(&mut Database) -> Result<(), AppError> + Send,
    {
        let label = label.unwrap_or(DEFAULT_LABEL);
        let span = tracing::info_span!("mutate", label);
        self.mutate_inner(label, mutator).instrument(span).await
    }

    async fn mutate_inner<F>(&self, label: &str, mutator: F) -> Result<Database, AppError>
    where
        F: FnOnce(&mut Database) -> Result<(), AppError> + Send,
    {
        let _guard = match &self.write_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        let timer = self.metrics.start_mutation(label);

        let mut db = match self.load().await {
            Ok(db) => db,
            Err(err) => {
                timer.finish(MutationOutcome::LoadFailed);
                return Err(err);
            }
        };
        let before = db.clone();

        if self.backups.maybe_backup(self.store.as_ref(), label, &before).await {
            self.metrics.record_backup();
        }

        if let Err(err) = mutator(&mut db) {
            tracing::debug!(error = %err, "mutator rejected the change");
            timer.finish(MutationOutcome::MutatorRejected);
            return Err(err);
        }

        if !is_analytics_label(label) {
            if let Err(violation) = apply_operational_rules(&before, &mut db) {
                tracing::warn!(code = %violation.code(), "mutation rejected by operational rules");
                timer.finish(MutationOutcome::RuleRejected);
                return Err(violation.into());
            }
        }

        sync::synchronize(&mut db);

        if let Err(err) = validate_document(&db) {
            tracing::warn!(error = %err, "mutated document failed schema validation");
            timer.finish(MutationOutcome::MutatorRejected);
            return Err(err.into());
        }

        match self.persist(&before, &db).await {
            Ok(written) => {
                tracing::info!(tables = written.len(), written = ?written, "mutation committed");
                timer.finish(MutationOutcome::Committed);
                Ok(db)
            }
            Err(err) => {
                tracing::error!(
                    failed_table = %err.failed_table,
                    committed = ?err.committed_tables,
                    pending = ?err.pending_tables,
                    row_keys = ?err.row_keys,
                    error = %err.source,
                    "persist failed part-way; committed tables hold the new state"
                );
                timer.finish(MutationOutcome::PersistFailed);
                Err(err.into())
            }
        }
    }

    async fn load(&self) -> Result<Database, AppError> {
        let loaded = try_join_all(PERSIST_ORDER.iter().map(|spec| self.load_table(spec))).await?;
        let tables: TableSet = loaded.into_iter().collect();

        let (mut db, vendor_menus) = decode_database(tables)?;
        sync::attach_restaurant_menus(&mut db, vendor_menus);
        sync::sync_user_profiles(&mut db);
        sync::sync_behavior_profiles(&mut db);

        validate_document(&db)?;
        tracing::debug!(
            bookings = db.bookings.len(),
            food_orders = db.food_orders.len(),
            "document loaded"
        );
        Ok(db)
    }

    async fn load_table(&self, spec: &'static TableSpec) -> Result<(&'static str, Vec<Row>), StoreError> {
        let page_size = self.options.page_size.max(1);
        let mut rows = Vec::new();
        loop {
            let page = match self.store.select_page(spec.name, spec.order_by, rows.len(), page_size).await {
                Ok(page) => page,
                Err(StoreError::MissingTable { .. }) if spec.optional => {
                    tracing::debug!(table = spec.name, "optional table not deployed; reading as empty");
                    return Ok((spec.name, Vec::new()));
                }
                Err(err) => return Err(err),
            };
            let fetched = page.len();
            rows.extend(page);
            if fetched < page_size {
                return Ok((spec.name, rows));
            }
        }
    }

    /// Write every changed table in `PERSIST_ORDER`; returns the tables written
    async fn persist(&self, before: &Database, after: &Database) -> Result<Vec<String>, PersistError> {
        let mut old = encode_database(before).map_err(encoding_failure)?;
        let mut new = encode_database(after).map_err(encoding_failure)?;

        let plans: Vec<(&'static TableSpec, TablePlan)> = PERSIST_ORDER
            .iter()
            .filter_map(|spec| {
                let old_rows = old.remove(spec.name).unwrap_or_default();
                let new_rows = new.remove(spec.name).unwrap_or_default();
                plan_table(spec, &old_rows, new_rows).map(|plan| (spec, plan))
            })
            .collect();

        let mut committed = Vec::with_capacity(plans.len());
        for (index, (spec, plan)) in plans.iter().enumerate() {
            if let Err(source) = self.write_table(spec, plan).await {
                return Err(PersistError {
                    failed_table: spec.name.to_string(),
                    committed_tables: committed,
                    pending_tables: plans[index + 1..].iter().map(|(spec, _)| spec.name.to_string()).collect(),
                    row_keys: plan.row_keys(spec),
                    source,
                });
            }
            committed.push(spec.name.to_string());
        }
        Ok(committed)
    }

    async fn write_table(&self, spec: &TableSpec, plan: &TablePlan) -> Result<(), StoreError> {
        match self.apply_plan(spec, plan).await {
            Err(StoreError::MissingTable { .. }) if spec.optional => {
                tracing::debug!(table = spec.name, "optional table not deployed; write skipped");
                Ok(())
            }
            other => other,
        }
    }

    async fn apply_plan(&self, spec: &TableSpec, plan: &TablePlan) -> Result<(), StoreError> {
        match plan {
            TablePlan::Upsert { rows, removed } => {
                if !rows.is_empty() {
                    self.write_rows(spec, rows.clone(), true).await?;
                }
                if !removed.is_empty() {
                    let filter = DeleteFilter::KeyIn { column: spec.conflict_key.to_string(), values: removed.clone() };
                    self.with_timeout(spec.name, self.store.delete_where(spec.name, &filter)).await?;
                }
                Ok(())
            }
            TablePlan::Append { rows } => self.write_rows(spec, rows.clone(), false).await,
            TablePlan::Replace { rows } => {
                // Delete precedes insert; an empty replacement never reaches here
                self.with_timeout(spec.name, self.store.delete_where(spec.name, &DeleteFilter::All)).await?;
                self.write_rows(spec, rows.clone(), false).await
            }
        }
    }

    /// Upsert or insert rows, stripping columns the deployed schema lacks
    ///
    /// Each distinct missing column is stripped once; a column reported twice
    /// (or the conflict key itself) fails the write.
    async fn write_rows(&self, spec: &TableSpec, mut rows: Vec<Row>, update: bool) -> Result<(), StoreError> {
        let mut stripped = BTreeSet::new();
        loop {
            let write = async {
                if update {
                    self.store.upsert(spec.name, &rows, spec.conflict_key).await
                } else {
                    self.store.insert_ignore_duplicates(spec.name, &rows, spec.conflict_key).await
                }
            };
            let result = self.with_timeout(spec.name, write).await;
            match result {
                Ok(()) => {
                    self.metrics.record_table_write(rows.len());
                    return Ok(());
                }
                Err(StoreError::MissingColumn { column, .. })
                    if column != spec.conflict_key && !stripped.contains(&column) =>
                {
                    stripped.insert(column.clone());
                    tracing::warn!(table = spec.name, column = %column, "column missing on deployed schema; retrying without it");
                    self.metrics.record_schema_drift();
                    for row in rows.iter_mut() {
                        row.remove(&column);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn with_timeout<F>(&self, table: &str, write: F) -> Result<(), StoreError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        match self.options.write_timeout {
            Some(limit) => tokio::time::timeout(limit, write)
                .await
                .unwrap_or_else(|_| Err(StoreError::Timeout { table: table.to_string() })),
            None => write.await,
        }
    }
}
