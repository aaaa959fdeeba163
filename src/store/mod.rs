// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side state stores.
//!
//! Each store keeps a local snapshot of one collection in step with the
//! remote table service. All of them are built once, together, by
//! [`Stores::new`] and handed to consumers by reference.

pub mod cell;
pub mod feed;
pub mod goals;
pub mod session;
pub mod skills;
pub mod sync;

pub use cell::{Snapshot, StoreCell};
pub use feed::{FeedStats, FeedStore};
pub use goals::{related_skill, upcoming_goals, GoalFilter, GoalStatus, GoalStore};
pub use session::{SessionPhase, SessionState, SessionStore};
pub use skills::{ProgressMap, SkillStore};
pub use sync::{Record, SyncStore};

use crate::db::TableService;
use crate::services::auth::AuthService;
use std::sync::Arc;

/// Every store the application uses.
pub struct Stores {
    pub session: SessionStore,
    pub skills: SkillStore,
    pub goals: GoalStore,
    pub feed: FeedStore,
}

impl Stores {
    pub fn new(auth: Arc<dyn AuthService>, tables: Arc<dyn TableService>) -> Self {
        Self {
            session: SessionStore::new(auth, tables.clone()),
            skills: SkillStore::new(tables.clone()),
            goals: GoalStore::new(tables.clone()),
            feed: FeedStore::new(tables),
        }
    }

    /// Drop every cached snapshot (after sign-out, or between tests).
    pub fn reset(&self) {
        self.session.reset();
        self.skills.reset();
        self.goals.reset();
        self.feed.reset();
    }
}
