// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and sign-out routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::store::{SessionPhase, Snapshot, SessionState};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/session", get(current_session))
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Session store state as seen by the frontend. The token never leaves the server.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub pending_confirmation: bool,
    pub error: Option<String>,
}

impl From<Snapshot<SessionState>> for SessionResponse {
    fn from(snapshot: Snapshot<SessionState>) -> Self {
        Self {
            phase: snapshot.data.phase,
            identity: snapshot.data.identity,
            pending_confirmation: snapshot.data.pending_confirmation,
            error: snapshot.error,
        }
    }
}

/// Auth failures are the caller's to fix (bad password, taken e-mail).
fn auth_failure(snapshot: &Snapshot<SessionState>) -> AppError {
    AppError::BadRequest(
        snapshot
            .error
            .clone()
            .unwrap_or_else(|| "Authentication failed".to_string()),
    )
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>> {
    let session = &state.stores.session;
    session
        .sign_up(&req.email, &req.password, &req.display_name)
        .await;

    let snapshot = session.snapshot();
    if snapshot.error.is_some() {
        return Err(auth_failure(&snapshot));
    }
    Ok(Json(snapshot.into()))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>> {
    let session = &state.stores.session;
    if !session.sign_in(&req.email, &req.password).await {
        return Err(auth_failure(&session.snapshot()));
    }
    Ok(Json(session.snapshot().into()))
}

/// Sign out and drop every cached collection. Always answers with the
/// signed-out state; a remote failure shows up in `error`.
async fn sign_out(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let stores = &state.stores;
    stores.session.sign_out().await;
    stores.skills.reset();
    stores.goals.reset();
    stores.feed.reset();
    Json(stores.session.snapshot().into())
}

/// Re-check the backend session and reload the profile.
async fn current_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let session = &state.stores.session;
    session.refresh_identity().await;
    Json(session.snapshot().into())
}
