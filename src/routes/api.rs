// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, plans, dashboard,
//! skills (with progress) and goals.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Goal, GoalPatch, Identity, NewGoal, NewProgressEntry, NewSkill, Plan, Skill, SkillPatch,
    SkillProgress,
};
use crate::routes::{store_failure, ListResponse};
use crate::services::dashboard::{self, DashboardSummary};
use crate::store::{related_skill, GoalFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a signed-in session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/plans", get(get_plans))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/skills", get(list_skills).post(create_skill))
        .route("/api/skills/{id}", patch(update_skill).delete(delete_skill))
        .route(
            "/api/skills/{id}/progress",
            get(list_progress).post(log_progress),
        )
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/{id}", patch(update_goal).delete(delete_goal))
        .route("/api/goals/{id}/completion", put(set_goal_completion))
}

// ─── Profile & Plans ─────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub identity: Identity,
    pub plan: Plan,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    let plan = Plan::for_tier(user.identity.subscription_tier);
    Json(MeResponse {
        identity: user.identity,
        plan,
    })
}

async fn get_plans() -> Json<Vec<Plan>> {
    Json(Plan::catalogue())
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardSummary>> {
    Ok(Json(dashboard::load(&state.stores).await?))
}

// ─── Skills ──────────────────────────────────────────────────

async fn list_skills(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse<Skill>>> {
    let skills = &state.stores.skills;
    if skills.fetch_skills().await.is_none() {
        return Err(store_failure(skills.snapshot().error));
    }
    Ok(Json(skills.snapshot().into()))
}

async fn create_skill(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new_skill): Json<NewSkill>,
) -> Result<(StatusCode, Json<Skill>)> {
    if new_skill.name.trim().is_empty() {
        return Err(AppError::BadRequest("Skill name is required".to_string()));
    }

    let skills = &state.stores.skills;
    // Count against a fresh list; fall back to the cache if the fetch fails.
    let current = skills
        .fetch_skills()
        .await
        .map(|s| s.len())
        .unwrap_or_else(|| skills.len());
    let tier = user.identity.subscription_tier;
    let limits = tier.limits();
    if !limits.allows_another_skill(current) {
        return Err(AppError::PlanLimit(format!(
            "The {} plan allows {} skills",
            Plan::for_tier(tier).name,
            limits.max_skills.unwrap_or(current)
        )));
    }

    match skills.add_skill(&new_skill).await {
        Some(skill) => {
            tracing::info!(user_id = user.id(), skill_id = %skill.id, "Skill created");
            Ok((StatusCode::CREATED, Json(skill)))
        }
        None => Err(store_failure(skills.snapshot().error)),
    }
}

async fn update_skill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<SkillPatch>,
) -> Result<Json<Skill>> {
    let skills = &state.stores.skills;
    skills
        .update_skill(&id, &patch)
        .await
        .map(Json)
        .ok_or_else(|| store_failure(skills.snapshot().error))
}

async fn delete_skill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let skills = &state.stores.skills;
    if !skills.delete_skill(&id).await {
        return Err(store_failure(skills.snapshot().error));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<SkillProgress>>> {
    let skills = &state.stores.skills;
    match skills.fetch_progress(&id).await {
        Some(entries) => Ok(Json(ListResponse::with_items(
            entries,
            skills.progress_snapshot(),
        ))),
        None => Err(store_failure(skills.progress_snapshot().error)),
    }
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub date: NaiveDate,
    pub progress_value: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

async fn log_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<(StatusCode, Json<SkillProgress>)> {
    let entry = NewProgressEntry {
        skill_id: id,
        date: req.date,
        progress_value: req.progress_value,
        notes: req.notes.filter(|n| !n.trim().is_empty()),
    };
    entry.validate().map_err(AppError::BadRequest)?;

    let skills = &state.stores.skills;
    skills
        .add_progress(&entry)
        .await
        .map(|stored| (StatusCode::CREATED, Json(stored)))
        .ok_or_else(|| store_failure(skills.progress_snapshot().error))
}

// ─── Goals ───────────────────────────────────────────────────

/// A goal with the name of the skill it belongs to, if that skill still exists.
#[derive(Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub skill_name: Option<String>,
}

async fn list_goals(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<GoalFilter>,
) -> Result<Json<ListResponse<GoalView>>> {
    let goals = &state.stores.goals;
    let skills = &state.stores.skills;
    let (fetched, _) = tokio::join!(goals.fetch_goals(), skills.fetch_skills());
    if fetched.is_none() {
        return Err(store_failure(goals.snapshot().error));
    }

    // A failed skill fetch only costs the names; the cache is used instead.
    let known_skills = skills.skills();
    let items = goals
        .filter(&filter)
        .into_iter()
        .map(|goal| GoalView {
            skill_name: related_skill(&goal, &known_skills).map(|s| s.name.clone()),
            goal,
        })
        .collect();
    Ok(Json(ListResponse::with_items(items, goals.snapshot())))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new_goal): Json<NewGoal>,
) -> Result<(StatusCode, Json<Goal>)> {
    if new_goal.title.trim().is_empty() {
        return Err(AppError::BadRequest("Goal title is required".to_string()));
    }

    let goals = &state.stores.goals;
    let current = goals
        .fetch_goals()
        .await
        .map(|g| g.len())
        .unwrap_or_else(|| goals.len());
    let tier = user.identity.subscription_tier;
    let limits = tier.limits();
    if !limits.allows_another_goal(current) {
        return Err(AppError::PlanLimit(format!(
            "The {} plan allows {} goals",
            Plan::for_tier(tier).name,
            limits.max_goals.unwrap_or(current)
        )));
    }

    match goals.add_goal(new_goal).await {
        Some(goal) => {
            tracing::info!(user_id = user.id(), goal_id = %goal.id, "Goal created");
            Ok((StatusCode::CREATED, Json(goal)))
        }
        None => Err(store_failure(goals.snapshot().error)),
    }
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<GoalPatch>,
) -> Result<Json<Goal>> {
    let goals = &state.stores.goals;
    goals
        .update_goal(&id, &patch)
        .await
        .map(Json)
        .ok_or_else(|| store_failure(goals.snapshot().error))
}

async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let goals = &state.stores.goals;
    if !goals.delete_goal(&id).await {
        return Err(store_failure(goals.snapshot().error));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

async fn set_goal_completion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<Goal>> {
    let goals = &state.stores.goals;
    goals
        .toggle_completion(&id, req.completed)
        .await
        .map(Json)
        .ok_or_else(|| store_failure(goals.snapshot().error))
}
