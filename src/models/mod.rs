// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod goal;
pub mod plan;
pub mod post;
pub mod skill;
pub mod user;

pub use goal::{Goal, GoalPatch, NewGoal};
pub use plan::{Plan, PlanLimits};
pub use post::{NewPost, Post, PostPatch};
pub use skill::{Difficulty, NewProgressEntry, NewSkill, Priority, Skill, SkillPatch, SkillProgress};
pub use user::{Identity, Session, SessionUser, SubscriptionTier};

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable patch field so that an absent key stays `None`
/// while an explicit `null` becomes `Some(None)` (clear the column).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
