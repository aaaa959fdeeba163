// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table storage layer.
//!
//! Stores talk to a [`TableService`]: either the hosted REST table API
//! ([`RestTables`]) or in-process tables ([`MemoryTables`]).

pub mod memory;
pub mod rest;

pub use memory::MemoryTables;
pub use rest::RestTables;

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Collection names as constants.
pub mod collections {
    pub const SKILLS: &str = "skills";
    pub const GOALS: &str = "goals";
    pub const SKILL_PROGRESS: &str = "skill_progress";
    /// Profiles keyed by auth user id
    pub const PROFILES: &str = "profiles";
    pub const POSTS: &str = "posts";
}

/// Sort column and direction for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// Equality filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows whose `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }
}

/// Generic per-collection operations against the remote table service.
///
/// Rows are JSON objects; ids are assigned by the service.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Fetch all rows matching `query`, in the requested order.
    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Value>, AppError>;

    /// Insert one row and return it as stored (with id and defaults).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError>;

    /// Apply a partial update to the row with `id` and return the updated row.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, AppError>;

    /// Hard-delete the row with `id`.
    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError>;
}
