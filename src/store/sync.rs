// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic collection store kept in step with one remote table.
//!
//! Every operation is one-shot: issue the remote call, then apply the
//! backend's answer to the local snapshot. Nothing is applied before the
//! call succeeds and failures never escape: they are recorded in the
//! snapshot's `error` and reported to the caller as `None`/`false`.

use crate::db::{OrderBy, TableQuery, TableService};
use crate::error::AppError;
use crate::store::cell::{Snapshot, StoreCell};
use crate::time_utils::now_rfc3339;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A row type that a [`SyncStore`] can hold.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Remote collection name.
    const TABLE: &'static str;
    /// Ordering requested by `fetch_all`.
    const ORDER: OrderBy;
    /// Where newly added records go in the local snapshot.
    const PREPEND_NEW: bool;

    /// Client-supplied fields for creation (no id, owner or timestamps).
    type Draft: Serialize + Send + Sync;
    /// Partial update; unset fields are not sent.
    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &str;
}

/// Local snapshot of one collection plus the operations that change it.
pub struct SyncStore<T: Record> {
    tables: Arc<dyn TableService>,
    cell: StoreCell<Vec<T>>,
    /// Sequence number of the newest `fetch_all` issued.
    fetch_ticket: AtomicU64,
}

/// Decode backend rows into records.
pub(crate) fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, AppError> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

pub(crate) fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> Result<T, AppError> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Backend(format!("Malformed {} row: {}", table, e)))
}

/// Serialize `value` to a JSON object and stamp the given timestamp columns.
pub(crate) fn stamped(value: &impl Serialize, columns: &[&str]) -> Result<Value, AppError> {
    let mut json = serde_json::to_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Serialize failed: {}", e)))?;
    if !json.is_object() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Expected a JSON object, got {}",
            json
        )));
    }
    if let Value::Object(fields) = &mut json {
        let now = now_rfc3339();
        for column in columns {
            fields.insert((*column).to_string(), Value::String(now.clone()));
        }
    }
    Ok(json)
}

impl<T: Record> SyncStore<T> {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self {
            tables,
            cell: StoreCell::new(Vec::new()),
            fetch_ticket: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<T>> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<T>>> {
        self.cell.subscribe()
    }

    /// Current records.
    pub fn items(&self) -> Vec<T> {
        self.cell.read(|items| items.clone())
    }

    pub fn len(&self) -> usize {
        self.cell.read(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached record with `id`, if present.
    pub fn get(&self, id: &str) -> Option<T> {
        self.cell
            .read(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    pub fn reset(&self) {
        self.cell.reset();
    }

    /// Record a failure that happened before any remote call (validation etc.).
    pub fn record_failure(&self, operation: &'static str, err: &AppError) {
        self.cell.begin(operation).fail(err);
    }

    /// Replace the snapshot with the full ordered collection.
    ///
    /// If a newer fetch was issued while this one was in flight, this
    /// result is not applied (the caller still gets what it fetched).
    pub async fn fetch_all(&self) -> Option<Vec<T>> {
        let ticket = self.fetch_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let op = self.cell.begin("fetch_all");
        let is_current = || self.fetch_ticket.load(Ordering::SeqCst) == ticket;

        let query = TableQuery::new().order(T::ORDER);
        let result = match self.tables.select(T::TABLE, &query).await {
            Ok(rows) => decode_rows::<T>(T::TABLE, rows),
            Err(e) => Err(e),
        };

        match result {
            Ok(items) => {
                let fetched = items.clone();
                let applied = op.finish(is_current, None, move |data| *data = items);
                if applied {
                    tracing::debug!(table = T::TABLE, count = fetched.len(), "Fetched collection");
                }
                Some(fetched)
            }
            Err(e) => {
                tracing::warn!(table = T::TABLE, error = %e, "Fetch failed");
                op.finish(is_current, Some(e.to_string()), |_| {});
                None
            }
        }
    }

    /// Create a record; the backend assigns id, owner and defaults.
    pub async fn add(&self, draft: &T::Draft) -> Option<T> {
        let op = self.cell.begin("add");

        let result = match stamped(draft, &["created_at", "updated_at"]) {
            Ok(row) => match self.tables.insert(T::TABLE, row).await {
                Ok(row) => decode_row::<T>(T::TABLE, row),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => {
                let stored = record.clone();
                op.succeed(move |items| {
                    if T::PREPEND_NEW {
                        items.insert(0, record);
                    } else {
                        items.push(record);
                    }
                });
                tracing::debug!(table = T::TABLE, id = stored.id(), "Record added");
                Some(stored)
            }
            Err(e) => {
                op.fail(&e);
                None
            }
        }
    }

    /// Apply a partial update and replace the cached record with the backend's copy.
    pub async fn update(&self, id: &str, patch: &T::Patch) -> Option<T> {
        let op = self.cell.begin("update");

        let result = match stamped(patch, &["updated_at"]) {
            Ok(patch) => match self.tables.update(T::TABLE, id, patch).await {
                Ok(row) => decode_row::<T>(T::TABLE, row),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => {
                let stored = record.clone();
                op.succeed(move |items| {
                    if let Some(slot) = items.iter_mut().find(|item| item.id() == record.id()) {
                        *slot = record;
                    }
                });
                tracing::debug!(table = T::TABLE, id, "Record updated");
                Some(stored)
            }
            Err(e) => {
                op.fail(&e);
                None
            }
        }
    }

    /// Hard-delete a record.
    pub async fn delete(&self, id: &str) -> bool {
        let op = self.cell.begin("delete");

        match self.tables.delete(T::TABLE, id).await {
            Ok(()) => {
                op.succeed(|items| items.retain(|item| item.id() != id));
                tracing::debug!(table = T::TABLE, id, "Record deleted");
                true
            }
            Err(e) => {
                op.fail(&e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Draft {
        title: &'static str,
    }

    #[test]
    fn test_stamped_adds_timestamp_columns() {
        let json = stamped(&Draft { title: "x" }, &["created_at", "updated_at"]).unwrap();
        assert_eq!(json["title"], "x");
        assert!(json["created_at"].is_string());
        assert_eq!(json["created_at"], json["updated_at"]);
    }

    #[test]
    fn test_stamped_rejects_non_objects() {
        assert!(stamped(&"plain string", &["updated_at"]).is_err());
    }

    #[test]
    fn test_decode_reports_table() {
        let err = decode_row::<crate::models::Goal>("goals", serde_json::json!({ "id": 1 }))
            .unwrap_err();
        assert!(err.to_string().contains("Malformed goals row"));
    }
}
