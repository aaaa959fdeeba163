// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill and skill-progress models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Self-assessed difficulty of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
        };
        f.write_str(label)
    }
}

/// How much attention a skill should get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort rank, most urgent first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    /// High and medium priority skills count as actively worked on.
    pub fn is_active(self) -> bool {
        matches!(self, Priority::High | Priority::Medium)
    }
}

/// Skill record stored in the `skills` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Skill {
    pub id: String,
    /// Owner identity id
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a skill. Id, owner and timestamps come from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub priority: Priority,
}

/// Partial skill update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// One dated progress measurement for a skill (`skill_progress` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillProgress {
    pub id: String,
    pub skill_id: String,
    pub date: NaiveDate,
    /// Percentage, 0-100
    pub progress_value: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fields supplied when logging progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgressEntry {
    pub skill_id: String,
    pub date: NaiveDate,
    pub progress_value: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Highest accepted progress value.
pub const MAX_PROGRESS: u8 = 100;

impl NewProgressEntry {
    /// Reject values outside 0-100 before anything goes over the wire.
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_value > MAX_PROGRESS {
            return Err(format!(
                "progress value must be between 0 and {}, got {}",
                MAX_PROGRESS, self.progress_value
            ));
        }
        if self.skill_id.trim().is_empty() {
            return Err("skill id is required".to_string());
        }
        Ok(())
    }
}
