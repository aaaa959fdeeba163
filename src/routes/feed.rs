// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community feed routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewPost, Post};
use crate::routes::{store_failure, ListResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use crate::store::FeedStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(list_posts).post(publish_post))
        .route("/api/feed/{id}", delete(delete_post))
        .route("/api/feed/{id}/like", post(like_post))
}

#[derive(Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub q: String,
}

/// Feed listing with totals over every post (not just the matches).
#[derive(Serialize)]
pub struct FeedResponse {
    #[serde(flatten)]
    pub list: ListResponse<Post>,
    pub stats: FeedStats,
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let feed = &state.stores.feed;
    if feed.fetch_posts().await.is_none() {
        return Err(store_failure(feed.snapshot().error));
    }
    Ok(Json(FeedResponse {
        list: ListResponse::with_items(feed.search(&query.q), feed.snapshot()),
        stats: feed.stats(),
    }))
}

async fn publish_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new_post): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>)> {
    if new_post.title.trim().is_empty() || new_post.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "A post needs a title and content".to_string(),
        ));
    }

    let feed = &state.stores.feed;
    match feed.publish(&new_post).await {
        Some(post) => {
            tracing::info!(user_id = user.id(), post_id = %post.id, "Post published");
            Ok((StatusCode::CREATED, Json(post)))
        }
        None => Err(store_failure(feed.snapshot().error)),
    }
}

async fn like_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Post>> {
    let feed = &state.stores.feed;
    if feed.get(&id).is_none() {
        return Err(AppError::NotFound(format!("Post {} not found", id)));
    }
    feed.like(&id)
        .await
        .map(Json)
        .ok_or_else(|| store_failure(feed.snapshot().error))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let feed = &state.stores.feed;
    if !feed.delete_post(&id).await {
        return Err(store_failure(feed.snapshot().error));
    }
    Ok(StatusCode::NO_CONTENT)
}
