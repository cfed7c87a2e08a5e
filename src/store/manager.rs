//! Directory-backed record store.
//!
//! Each record type gets one JSON snapshot file named after its table
//! tag. Tables are loaded lazily into memory; reads are served from the
//! in-memory copy under a read lock, and every mutation rewrites the
//! snapshot file (temp file + rename) before the in-memory table is
//! replaced, so a failed write leaves nothing persisted for that batch.
//!
//! Reads are fail-soft: a missing, unreadable, or corrupt snapshot logs
//! a warning and behaves as an empty table.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{Query, Record};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to persist {table}: {reason}")]
    WriteFailed { table: &'static str, reason: String },
}

/// On-disk envelope for one table snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct TableSnapshot {
    saved_at: DateTime<Utc>,
    records: Vec<Value>,
}

/// A local record store persisted as one JSON snapshot per table.
///
/// Mutations serialize on the table write lock (single writer); readers
/// clone the current table under the read lock and never observe a
/// half-applied batch.
pub struct RecordStore {
    dir: PathBuf,
    tables: RwLock<HashMap<&'static str, Vec<Value>>>,
}

impl RecordStore {
    pub fn open(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            tables: RwLock::new(HashMap::new()),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }

    /// Read a table snapshot from disk. Never fails: unreadable or
    /// corrupt snapshots are logged and treated as empty.
    async fn load_table(&self, table: &'static str) -> Vec<Value> {
        let path = self.table_path(table);
        let loaded = tokio::task::spawn_blocking(move || {
            if !path.exists() {
                return Vec::new();
            }
            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(table, error = %e, "Failed to read table snapshot");
                    return Vec::new();
                }
            };
            match serde_json::from_str::<TableSnapshot>(&contents) {
                Ok(snapshot) => {
                    debug!(table, saved_at = %snapshot.saved_at, count = snapshot.records.len(), "Loaded table snapshot");
                    snapshot.records
                }
                Err(e) => {
                    warn!(table, error = %e, "Discarding corrupt table snapshot");
                    Vec::new()
                }
            }
        })
        .await;

        match loaded {
            Ok(records) => records,
            Err(e) => {
                warn!(table, error = %e, "Table load task failed");
                Vec::new()
            }
        }
    }

    /// Current raw contents of a table, loading it on first access.
    async fn table_values<R: Record>(&self) -> Vec<Value> {
        {
            let tables = self.tables.read().await;
            if let Some(values) = tables.get(R::TABLE) {
                return values.clone();
            }
        }

        let loaded = self.load_table(R::TABLE).await;
        let mut tables = self.tables.write().await;
        tables.entry(R::TABLE).or_insert(loaded).clone()
    }

    /// Fetch records matching a query. Never fails; records that no
    /// longer deserialize are skipped with a warning.
    pub async fn fetch<R: Record>(&self, query: Query<R>) -> Vec<R> {
        let values = self.table_values::<R>().await;
        let mut records: Vec<R> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(table = R::TABLE, error = %e, "Skipping undecodable record");
                    None
                }
            })
            .collect();

        if let Some(predicate) = &query.predicate {
            records.retain(|record| predicate(record));
        }
        if let Some(comparator) = &query.sort {
            records.sort_by(|a, b| comparator(a, b));
        }

        let iter = records.into_iter().skip(query.offset);
        match query.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// Upsert a batch of records by id.
    ///
    /// The updated snapshot is committed to disk before the in-memory
    /// table is replaced; on `StoreError::WriteFailed` nothing from the
    /// batch was persisted.
    pub async fn save<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write().await;
        if !tables.contains_key(R::TABLE) {
            let loaded = self.load_table(R::TABLE).await;
            tables.insert(R::TABLE, loaded);
        }

        let mut next = tables.get(R::TABLE).cloned().unwrap_or_default();
        for record in records {
            let value = serde_json::to_value(record).map_err(|e| StoreError::WriteFailed {
                table: R::TABLE,
                reason: e.to_string(),
            })?;
            let id = record.id().to_string();
            let existing = next
                .iter()
                .position(|v| v.get("id").and_then(Value::as_str) == Some(id.as_str()));
            match existing {
                Some(pos) => next[pos] = value,
                None => next.push(value),
            }
        }

        self.persist(R::TABLE, &next).await?;
        debug!(table = R::TABLE, saved = records.len(), total = next.len(), "Saved records");
        tables.insert(R::TABLE, next);
        Ok(())
    }

    /// Remove every record of a type, deleting its snapshot file.
    pub async fn delete_all<R: Record>(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let path = self.table_path(R::TABLE);
        let removed = tokio::task::spawn_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.to_string()),
        })
        .await;

        match removed {
            Ok(Ok(())) => {
                debug!(table = R::TABLE, "Cleared table");
                tables.insert(R::TABLE, Vec::new());
                Ok(())
            }
            Ok(Err(reason)) => Err(StoreError::WriteFailed {
                table: R::TABLE,
                reason,
            }),
            Err(e) => Err(StoreError::WriteFailed {
                table: R::TABLE,
                reason: e.to_string(),
            }),
        }
    }

    /// Write a table snapshot atomically: temp file, then rename.
    async fn persist(&self, table: &'static str, records: &[Value]) -> Result<(), StoreError> {
        let snapshot = TableSnapshot {
            saved_at: Utc::now(),
            records: records.to_vec(),
        };
        let contents =
            serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::WriteFailed {
                table,
                reason: e.to_string(),
            })?;

        let path = self.table_path(table);
        let tmp_path = self.dir.join(format!("{}.json.tmp", table));
        let written = tokio::task::spawn_blocking(move || {
            std::fs::write(&tmp_path, contents).map_err(|e| e.to_string())?;
            std::fs::rename(&tmp_path, &path).map_err(|e| e.to_string())
        })
        .await;

        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(StoreError::WriteFailed { table, reason }),
            Err(e) => Err(StoreError::WriteFailed {
                table,
                reason: e.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
