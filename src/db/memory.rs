// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process tables for offline mode and tests.
//!
//! Mimics the hosted service closely enough for the stores: ids are
//! assigned on insert, rows in owned tables are stamped with (and, for
//! private tables, filtered to) the signed-in owner, and failures or
//! slow responses can be injected per call.

use crate::db::{collections, TableQuery, TableService};
use crate::error::AppError;
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

/// Tables whose rows get a `user_id` column stamped on insert.
const OWNED_TABLES: [&str; 3] = [collections::SKILLS, collections::GOALS, collections::POSTS];
/// Owned tables that only the owner may see.
const PRIVATE_TABLES: [&str; 2] = [collections::SKILLS, collections::GOALS];

#[derive(Default)]
struct Inner {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    owner: RwLock<Option<String>>,
    failures: Mutex<VecDeque<String>>,
    delays: Mutex<VecDeque<Duration>>,
    calls: AtomicUsize,
}

/// In-memory [`TableService`]. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryTables {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity that owns new rows (what row-level security would use).
    pub fn set_owner(&self, owner: Option<String>) {
        *self.inner.owner.write().unwrap_or_else(PoisonError::into_inner) = owner;
    }

    pub fn owner(&self) -> Option<String> {
        self.inner
            .owner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make the next call fail with a database error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        lock(&self.inner.failures).push_back(message.to_string());
    }

    /// Hold the next call's response for `delay`. Its result is computed
    /// before the wait, like a response already in flight.
    pub fn delay_next(&self, delay: Duration) {
        lock(&self.inner.delays).push_back(delay);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(AtomicOrdering::SeqCst)
    }

    /// Insert rows verbatim, bypassing owner stamping and failure injection.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        lock(&self.inner.tables)
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Raw contents of a table, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.inner.tables)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Count the call and pop any injected failure and delay for it.
    fn begin_call(&self) -> (Option<String>, Option<Duration>) {
        self.inner.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let failure = lock(&self.inner.failures).pop_front();
        let delay = lock(&self.inner.delays).pop_front();
        (failure, delay)
    }

    async fn respond<T>(
        &self,
        failure: Option<String>,
        delay: Option<Duration>,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(AppError::Database(message)),
            None => result,
        }
    }

    fn visible(&self, table: &str, row: &Value) -> bool {
        if !PRIVATE_TABLES.contains(&table) {
            return true;
        }
        match self.owner() {
            Some(owner) => row.get("user_id").and_then(Value::as_str) == Some(owner.as_str()),
            None => false,
        }
    }

    fn do_select(&self, table: &str, query: &TableQuery) -> Vec<Value> {
        let tables = lock(&self.inner.tables);
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| self.visible(table, row))
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|(column, value)| column_equals(row, column, value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = query.order {
            rows.sort_by(|a, b| {
                let ord = compare_json(
                    a.get(order.column).unwrap_or(&Value::Null),
                    b.get(order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        rows
    }

    fn do_insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let Value::Object(mut fields) = row else {
            return Err(AppError::BadRequest(format!(
                "Insert into {} expects an object",
                table
            )));
        };

        if OWNED_TABLES.contains(&table) && !fields.contains_key("user_id") {
            let owner = self.owner().ok_or(AppError::Unauthorized)?;
            fields.insert("user_id".to_string(), Value::String(owner));
        }

        let id = fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
            .clone();
        for column in ["created_at", "updated_at"] {
            if table != collections::SKILL_PROGRESS && !fields.contains_key(column) {
                fields.insert(column.to_string(), Value::String(now_rfc3339()));
            }
        }

        let mut tables = lock(&self.inner.tables);
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| r.get("id") == Some(&id)) {
            return Err(AppError::Database(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                table
            )));
        }

        let row = Value::Object(fields);
        rows.push(row.clone());
        Ok(row)
    }

    fn do_update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError> {
        let Value::Object(patch) = patch else {
            return Err(AppError::BadRequest(format!(
                "Update of {} expects an object",
                table
            )));
        };

        let mut tables = lock(&self.inner.tables);
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| column_equals(row, "id", id) && self.visible(table, row))
            })
            .ok_or_else(|| AppError::NotFound(format!("{} row {}", table, id)))?;

        if let Value::Object(fields) = row {
            merge(fields, patch);
        }
        Ok(row.clone())
    }

    fn do_delete(&self, table: &str, id: &str) {
        let mut tables = lock(&self.inner.tables);
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !(column_equals(row, "id", id) && self.visible(table, row)));
        }
    }
}

fn merge(fields: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        fields.insert(key, value);
    }
}

/// Equality as the REST filter `col=eq.value` sees it (string form).
fn column_equals(row: &Value, column: &str, value: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

/// Order JSON scalars; nulls sort last ascending, first descending.
fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl TableService for MemoryTables {
    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Value>, AppError> {
        let (failure, delay) = self.begin_call();
        let result = Ok(self.do_select(table, query));
        self.respond(failure, delay, result).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let (failure, delay) = self.begin_call();
        let result = match failure {
            Some(_) => Ok(Value::Null),
            None => self.do_insert(table, row),
        };
        self.respond(failure, delay, result).await
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError> {
        let (failure, delay) = self.begin_call();
        let result = match failure {
            Some(_) => Ok(Value::Null),
            None => self.do_update(table, id, patch),
        };
        self.respond(failure, delay, result).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError> {
        let (failure, delay) = self.begin_call();
        if failure.is_none() {
            self.do_delete(table, id);
        }
        self.respond(failure, delay, Ok(())).await
    }
}
