// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::double_option;

/// Goal record stored in the `goals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Goal {
    pub id: String,
    /// Owner identity id
    pub user_id: String,
    /// Related skill. Not re-validated; may dangle after the skill is deleted.
    #[serde(default)]
    pub skill_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: NaiveDate,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl NewGoal {
    /// Forms submit `""` for "no related skill"; store that as null.
    pub fn normalized(mut self) -> Self {
        self.skill_id = self.skill_id.filter(|id| !id.trim().is_empty());
        self.description = self.description.filter(|d| !d.trim().is_empty());
        self
    }
}

/// Partial goal update.
///
/// Nullable columns are `Option<Option<_>>`: outer `None` leaves the column
/// alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub skill_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl GoalPatch {
    /// Patch touching only the completion flag.
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: GoalPatch =
            serde_json::from_value(serde_json::json!({ "skill_id": null })).unwrap();
        assert_eq!(patch.skill_id, Some(None));
        assert_eq!(patch.description, None);

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "skill_id": null })
        );
    }

    #[test]
    fn test_completion_patch() {
        assert_eq!(
            serde_json::to_value(GoalPatch::completion(true)).unwrap(),
            serde_json::json!({ "completed": true })
        );
    }

    #[test]
    fn test_new_goal_normalizes_empty_strings() {
        let goal: NewGoal = serde_json::from_value(serde_json::json!({
            "title": "Learn X",
            "target_date": "2025-01-01",
            "skill_id": "",
            "description": "  "
        }))
        .unwrap();

        let goal = goal.normalized();
        assert_eq!(goal.skill_id, None);
        assert_eq!(goal.description, None);
        assert!(!goal.completed);
    }
}
