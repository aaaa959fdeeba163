// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard summary built from the skill and goal stores.

use crate::error::AppError;
use crate::models::{Goal, Skill};
use crate::store::{upcoming_goals, ProgressMap, Stores};
use crate::time_utils::format_time_ago;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound on concurrent progress fetches when loading the dashboard.
const MAX_CONCURRENT_PROGRESS_FETCHES: usize = 4;

pub const TOP_SKILLS: usize = 3;
pub const UPCOMING_GOALS: usize = 5;
pub const RECENT_ACTIVITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityKind {
    SkillAdded,
    SkillProgress,
    GoalAdded,
    GoalCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    /// "2 hours ago" etc., relative to when the summary was built
    pub time_ago: String,
}

/// One bar in the progress chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkillProgressPoint {
    pub skill_id: String,
    pub name: String,
    /// Latest logged value, 0 when nothing is logged yet
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardSummary {
    pub total_skills: usize,
    /// Skills with high or medium priority
    pub skills_in_progress: usize,
    pub upcoming_goal_count: usize,
    pub completed_goal_count: usize,
    pub top_skills: Vec<Skill>,
    pub upcoming_goals: Vec<Goal>,
    pub recent_activity: Vec<ActivityItem>,
    pub progress_chart: Vec<SkillProgressPoint>,
}

impl DashboardSummary {
    pub fn build(
        skills: &[Skill],
        goals: &[Goal],
        progress: &ProgressMap,
        now: DateTime<Utc>,
    ) -> Self {
        let mut top_skills = skills.to_vec();
        // Stable: equal priorities keep store order.
        top_skills.sort_by_key(|s| s.priority.rank());
        top_skills.truncate(TOP_SKILLS);

        let progress_chart = skills
            .iter()
            .map(|s| SkillProgressPoint {
                skill_id: s.id.clone(),
                name: s.name.clone(),
                progress: progress
                    .get(&s.id)
                    .and_then(|entries| entries.last())
                    .map(|e| e.progress_value)
                    .unwrap_or(0),
            })
            .collect();

        let completed_goal_count = goals.iter().filter(|g| g.completed).count();

        Self {
            total_skills: skills.len(),
            skills_in_progress: skills.iter().filter(|s| s.priority.is_active()).count(),
            upcoming_goal_count: goals.len() - completed_goal_count,
            completed_goal_count,
            top_skills,
            upcoming_goals: upcoming_goals(goals, UPCOMING_GOALS),
            recent_activity: recent_activity(skills, goals, progress, now),
            progress_chart,
        }
    }
}

/// Activity derived from record timestamps, newest first.
pub fn recent_activity(
    skills: &[Skill],
    goals: &[Goal],
    progress: &ProgressMap,
    now: DateTime<Utc>,
) -> Vec<ActivityItem> {
    let mut items: Vec<(ActivityKind, String, String, DateTime<Utc>)> = Vec::new();

    for skill in skills {
        items.push((
            ActivityKind::SkillAdded,
            "Added new skill".to_string(),
            format!("{} - {}", skill.name, skill.difficulty),
            skill.created_at,
        ));

        for entry in progress.get(&skill.id).into_iter().flatten() {
            let Some(at) = entry.date.and_hms_opt(0, 0, 0) else {
                continue;
            };
            items.push((
                ActivityKind::SkillProgress,
                format!("Updated progress on {}", skill.name),
                format!("Progress now {}%", entry.progress_value),
                at.and_utc(),
            ));
        }
    }

    for goal in goals {
        items.push((
            ActivityKind::GoalAdded,
            "Set new goal".to_string(),
            goal.title.clone(),
            goal.created_at,
        ));
        if goal.completed {
            items.push((
                ActivityKind::GoalCompleted,
                "Completed goal".to_string(),
                goal.title.clone(),
                goal.updated_at,
            ));
        }
    }

    items.sort_by(|a, b| b.3.cmp(&a.3));
    items.truncate(RECENT_ACTIVITY);

    items
        .into_iter()
        .map(|(kind, title, description, timestamp)| ActivityItem {
            kind,
            title,
            description,
            timestamp,
            time_ago: format_time_ago(timestamp, now),
        })
        .collect()
}

/// Refresh the skill and goal stores, then every skill's progress, and
/// summarise the result.
///
/// A failed skill or goal fetch fails the whole load. A failed progress
/// fetch only leaves that skill's chart bar at its cached value.
pub async fn load(stores: &Stores) -> Result<DashboardSummary, AppError> {
    let (skills, goals) = tokio::join!(stores.skills.fetch_skills(), stores.goals.fetch_goals());

    let skills = skills.ok_or_else(|| store_error(stores.skills.snapshot().error))?;
    let goals = goals.ok_or_else(|| store_error(stores.goals.snapshot().error))?;

    // Owned ids keep this future Send for axum handlers.
    let skill_ids: Vec<String> = skills.iter().map(|s| s.id.clone()).collect();
    let failed = stream::iter(skill_ids)
        .map(|skill_id| async move { stores.skills.fetch_progress(&skill_id).await.is_none() })
        .buffer_unordered(MAX_CONCURRENT_PROGRESS_FETCHES)
        .filter(|failed| futures_util::future::ready(*failed))
        .count()
        .await;
    if failed > 0 {
        tracing::warn!(failed, "Some progress histories could not be loaded");
    }

    let progress = stores.skills.progress_snapshot().data;
    Ok(DashboardSummary::build(&skills, &goals, &progress, Utc::now()))
}

fn store_error(message: Option<String>) -> AppError {
    AppError::Backend(message.unwrap_or_else(|| "Fetch failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{collections, MemoryTables};
    use crate::models::{Difficulty, Priority, SkillProgress};
    use crate::services::MemoryAuth;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::sync::Arc;

    fn skill(id: &str, priority: Priority, created_at: DateTime<Utc>) -> Skill {
        Skill {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: format!("Skill {}", id),
            category: "General".to_string(),
            difficulty: Difficulty::Intermediate,
            priority,
            created_at,
            updated_at: created_at,
        }
    }

    fn goal(id: &str, day: u32, completed: bool, at: DateTime<Utc>) -> Goal {
        Goal {
            id: id.to_string(),
            user_id: "u1".to_string(),
            skill_id: None,
            title: format!("Goal {}", id),
            description: None,
            target_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            completed,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_summary_counts_and_top_skills() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let skills = vec![
            skill("a", Priority::Low, now),
            skill("b", Priority::Medium, now),
            skill("c", Priority::High, now),
            skill("d", Priority::High, now),
        ];
        let goals = vec![
            goal("g1", 20, false, now),
            goal("g2", 5, true, now),
            goal("g3", 1, false, now),
        ];
        let mut progress = ProgressMap::new();
        progress.insert(
            "c".to_string(),
            vec![SkillProgress {
                id: "p1".to_string(),
                skill_id: "c".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
                progress_value: 40,
                notes: None,
            }],
        );

        let summary = DashboardSummary::build(&skills, &goals, &progress, now);

        assert_eq!(summary.total_skills, 4);
        assert_eq!(summary.skills_in_progress, 3);
        assert_eq!(summary.upcoming_goal_count, 2);
        assert_eq!(summary.completed_goal_count, 1);

        let top: Vec<&str> = summary.top_skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(top, vec!["c", "d", "b"]);

        let upcoming: Vec<&str> = summary.upcoming_goals.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(upcoming, vec!["g3", "g1"]);

        let chart: Vec<u8> = summary.progress_chart.iter().map(|p| p.progress).collect();
        assert_eq!(chart, vec![0, 0, 40, 0]);
    }

    #[test]
    fn test_recent_activity_newest_first_and_limited() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let skills: Vec<Skill> = (0..8)
            .map(|i| skill(&i.to_string(), Priority::Low, now - Duration::hours(i * 5)))
            .collect();
        let goals = vec![goal("done", 1, true, now - Duration::minutes(10))];

        let activity = recent_activity(&skills, &goals, &ProgressMap::new(), now);

        assert_eq!(activity.len(), RECENT_ACTIVITY);
        assert!(activity.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(activity[0].time_ago, "Just now");
        assert!(activity
            .iter()
            .any(|a| a.kind == ActivityKind::GoalCompleted));
        assert_eq!(activity.last().unwrap().time_ago, "1 day ago");
    }

    #[tokio::test]
    async fn test_load_runs_on_a_spawned_task() {
        let tables = MemoryTables::new();
        tables.set_owner(Some("u1".to_string()));
        let now = Utc::now();
        tables.seed(
            collections::SKILLS,
            vec![
                serde_json::to_value(skill("a", Priority::High, now)).unwrap(),
                serde_json::to_value(skill("b", Priority::Low, now)).unwrap(),
            ],
        );
        let auth = Arc::new(MemoryAuth::new(tables.clone()));
        let stores = Arc::new(Stores::new(auth, Arc::new(tables)));

        let summary = tokio::spawn(async move { load(&stores).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.total_skills, 2);
        assert_eq!(summary.progress_chart.len(), 2);
    }
}
