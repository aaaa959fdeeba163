// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill store: the user's skills (newest first) and, per skill, a lazily
//! fetched progress history (oldest first).
//!
//! The progress histories live in their own cell with their own loading
//! flag, keyed by skill id. Each skill's fetches are sequenced separately
//! so a slow, older fetch cannot overwrite a newer one.

use crate::db::{collections, OrderBy, TableQuery, TableService};
use crate::error::AppError;
use crate::models::{NewProgressEntry, NewSkill, Skill, SkillPatch, SkillProgress};
use crate::store::cell::{Snapshot, StoreCell};
use crate::store::sync::{decode_row, decode_rows, Record, SyncStore};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

impl Record for Skill {
    const TABLE: &'static str = collections::SKILLS;
    const ORDER: OrderBy = OrderBy::desc("created_at");
    const PREPEND_NEW: bool = true;

    type Draft = NewSkill;
    type Patch = SkillPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Progress histories keyed by skill id, each ascending by date.
pub type ProgressMap = HashMap<String, Vec<SkillProgress>>;

pub struct SkillStore {
    inner: SyncStore<Skill>,
    tables: Arc<dyn TableService>,
    progress: StoreCell<ProgressMap>,
    /// Newest fetch ticket issued per skill id.
    progress_tickets: DashMap<String, u64>,
    next_ticket: AtomicU64,
}

/// Insert keeping ascending date order; same-day entries keep arrival order.
fn insert_by_date(entries: &mut Vec<SkillProgress>, entry: SkillProgress) {
    let at = entries.partition_point(|e| e.date <= entry.date);
    entries.insert(at, entry);
}

impl SkillStore {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self {
            inner: SyncStore::new(tables.clone()),
            tables,
            progress: StoreCell::new(ProgressMap::new()),
            progress_tickets: DashMap::new(),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Skill>> {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Skill>>> {
        self.inner.subscribe()
    }

    pub fn progress_snapshot(&self) -> Snapshot<ProgressMap> {
        self.progress.snapshot()
    }

    pub fn skills(&self) -> Vec<Skill> {
        self.inner.items()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Skill> {
        self.inner.get(id)
    }

    pub fn reset(&self) {
        self.inner.reset();
        self.progress.reset();
        self.progress_tickets.clear();
    }

    pub async fn fetch_skills(&self) -> Option<Vec<Skill>> {
        self.inner.fetch_all().await
    }

    pub async fn add_skill(&self, skill: &NewSkill) -> Option<Skill> {
        self.inner.add(skill).await
    }

    pub async fn update_skill(&self, id: &str, patch: &SkillPatch) -> Option<Skill> {
        self.inner.update(id, patch).await
    }

    /// Delete a skill and drop its cached progress history.
    ///
    /// Goals referencing the skill are left alone.
    pub async fn delete_skill(&self, id: &str) -> bool {
        let deleted = self.inner.delete(id).await;
        if deleted {
            self.progress_tickets.remove(id);
            self.progress.update_data(|map| {
                map.remove(id);
            });
        }
        deleted
    }

    /// Load one skill's progress history. A skill with no entries yields
    /// an empty history, not an error.
    pub async fn fetch_progress(&self, skill_id: &str) -> Option<Vec<SkillProgress>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress_tickets.insert(skill_id.to_string(), ticket);

        let op = self.progress.begin("fetch_progress");
        let is_current = || {
            self.progress_tickets
                .get(skill_id)
                .is_some_and(|newest| *newest == ticket)
        };

        let query = TableQuery::new()
            .eq("skill_id", skill_id)
            .order(OrderBy::asc("date"));
        let result = match self
            .tables
            .select(collections::SKILL_PROGRESS, &query)
            .await
        {
            Ok(rows) => decode_rows::<SkillProgress>(collections::SKILL_PROGRESS, rows),
            Err(e) => Err(e),
        };

        match result {
            Ok(entries) => {
                let fetched = entries.clone();
                let key = skill_id.to_string();
                op.finish(is_current, None, move |map| {
                    map.insert(key, entries);
                });
                Some(fetched)
            }
            Err(e) => {
                tracing::warn!(skill_id, error = %e, "Progress fetch failed");
                op.finish(is_current, Some(e.to_string()), |_| {});
                None
            }
        }
    }

    /// Log a progress entry. Values outside 0-100 are rejected locally.
    pub async fn add_progress(&self, entry: &NewProgressEntry) -> Option<SkillProgress> {
        let op = self.progress.begin("add_progress");

        if let Err(msg) = entry.validate() {
            op.fail(&AppError::BadRequest(msg));
            return None;
        }

        let result = match serde_json::to_value(entry) {
            Ok(row) => match self.tables.insert(collections::SKILL_PROGRESS, row).await {
                Ok(row) => decode_row::<SkillProgress>(collections::SKILL_PROGRESS, row),
                Err(e) => Err(e),
            },
            Err(e) => Err(AppError::Internal(anyhow::anyhow!("Serialize failed: {}", e))),
        };

        match result {
            Ok(stored) => {
                let cached = stored.clone();
                op.succeed(move |map| {
                    insert_by_date(map.entry(cached.skill_id.clone()).or_default(), cached);
                });
                Some(stored)
            }
            Err(e) => {
                op.fail(&e);
                None
            }
        }
    }

    /// Cached history for one skill (empty if never fetched).
    pub fn progress_for(&self, skill_id: &str) -> Vec<SkillProgress> {
        self.progress
            .read(|map| map.get(skill_id).cloned().unwrap_or_default())
    }

    /// Most recent cached progress value for a skill.
    pub fn latest_progress(&self, skill_id: &str) -> Option<u8> {
        self.progress.read(|map| {
            map.get(skill_id)
                .and_then(|entries| entries.last())
                .map(|e| e.progress_value)
        })
    }
}
