// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal store: the user's goals, soonest target date first.

use crate::db::{collections, OrderBy, TableService};
use crate::models::{Goal, GoalPatch, NewGoal, Skill};
use crate::store::cell::Snapshot;
use crate::store::sync::{Record, SyncStore};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;

impl Record for Goal {
    const TABLE: &'static str = collections::GOALS;
    const ORDER: OrderBy = OrderBy::asc("target_date");
    const PREPEND_NEW: bool = false;

    type Draft = NewGoal;
    type Patch = GoalPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Completion filter used by the goal list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    All,
    Active,
    Completed,
}

/// Search term plus completion filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GoalFilter {
    #[serde(default, rename = "q")]
    pub search: String,
    #[serde(default)]
    pub status: GoalStatus,
}

impl GoalFilter {
    pub fn matches(&self, goal: &Goal) -> bool {
        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || goal.title.to_lowercase().contains(&term)
            || goal
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));

        let matches_status = match self.status {
            GoalStatus::All => true,
            GoalStatus::Active => !goal.completed,
            GoalStatus::Completed => goal.completed,
        };

        matches_search && matches_status
    }
}

/// Incomplete goals, soonest target date first.
pub fn upcoming_goals(goals: &[Goal], limit: usize) -> Vec<Goal> {
    let mut upcoming: Vec<Goal> = goals.iter().filter(|g| !g.completed).cloned().collect();
    upcoming.sort_by_key(|g| g.target_date);
    upcoming.truncate(limit);
    upcoming
}

/// Resolve a goal's related skill. A reference to a deleted skill reads as none.
pub fn related_skill<'a>(goal: &Goal, skills: &'a [Skill]) -> Option<&'a Skill> {
    let skill_id = goal.skill_id.as_deref()?;
    skills.iter().find(|s| s.id == skill_id)
}

pub struct GoalStore {
    inner: SyncStore<Goal>,
}

impl GoalStore {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self {
            inner: SyncStore::new(tables),
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Goal>> {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Goal>>> {
        self.inner.subscribe()
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.inner.items()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Goal> {
        self.inner.get(id)
    }

    pub fn reset(&self) {
        self.inner.reset();
    }

    pub async fn fetch_goals(&self) -> Option<Vec<Goal>> {
        self.inner.fetch_all().await
    }

    pub async fn add_goal(&self, goal: NewGoal) -> Option<Goal> {
        self.inner.add(&goal.normalized()).await
    }

    pub async fn update_goal(&self, id: &str, patch: &GoalPatch) -> Option<Goal> {
        self.inner.update(id, patch).await
    }

    pub async fn delete_goal(&self, id: &str) -> bool {
        self.inner.delete(id).await
    }

    /// Set the completed flag; nothing else but `updated_at` changes.
    pub async fn toggle_completion(&self, id: &str, completed: bool) -> Option<Goal> {
        self.inner.update(id, &GoalPatch::completion(completed)).await
    }

    /// Cached goals matching `filter`, in snapshot order.
    pub fn filter(&self, filter: &GoalFilter) -> Vec<Goal> {
        self.goals().into_iter().filter(|g| filter.matches(g)).collect()
    }

    pub fn upcoming(&self, limit: usize) -> Vec<Goal> {
        upcoming_goals(&self.goals(), limit)
    }
}
