// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community feed store: posts from every user, newest first.

use crate::db::{collections, OrderBy, TableService};
use crate::error::AppError;
use crate::models::{NewPost, Post, PostPatch};
use crate::store::cell::Snapshot;
use crate::store::sync::{Record, SyncStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

impl Record for Post {
    const TABLE: &'static str = collections::POSTS;
    const ORDER: OrderBy = OrderBy::desc("created_at");
    const PREPEND_NEW: bool = true;

    type Draft = NewPost;
    type Patch = PostPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Totals shown above the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub posts: usize,
    pub likes: u64,
}

pub struct FeedStore {
    inner: SyncStore<Post>,
}

impl FeedStore {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self {
            inner: SyncStore::new(tables),
        }
    }

    pub fn snapshot(&self) -> Snapshot<Vec<Post>> {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<Post>>> {
        self.inner.subscribe()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.inner.items()
    }

    pub fn get(&self, id: &str) -> Option<Post> {
        self.inner.get(id)
    }

    pub fn reset(&self) {
        self.inner.reset();
    }

    pub async fn fetch_posts(&self) -> Option<Vec<Post>> {
        self.inner.fetch_all().await
    }

    pub async fn publish(&self, post: &NewPost) -> Option<Post> {
        let draft = NewPost {
            title: post.title.trim().to_string(),
            content: post.content.trim().to_string(),
        };
        if draft.title.is_empty() || draft.content.is_empty() {
            self.inner.record_failure(
                "publish",
                &AppError::BadRequest("A post needs a title and content".to_string()),
            );
            return None;
        }
        self.inner.add(&draft).await
    }

    /// Add one like to a cached post.
    ///
    /// The new count is computed from the local copy, so two clients liking
    /// at once can lose a like; the last write wins.
    pub async fn like(&self, id: &str) -> Option<Post> {
        let Some(post) = self.inner.get(id) else {
            self.inner
                .record_failure("like", &AppError::NotFound(format!("Post {} not found", id)));
            return None;
        };

        let patch = PostPatch {
            likes: Some(post.likes.saturating_add(1)),
            ..PostPatch::default()
        };
        self.inner.update(id, &patch).await
    }

    pub async fn delete_post(&self, id: &str) -> bool {
        self.inner.delete(id).await
    }

    /// Cached posts whose title or body contains `term`.
    pub fn search(&self, term: &str) -> Vec<Post> {
        self.posts().into_iter().filter(|p| p.matches(term)).collect()
    }

    pub fn stats(&self) -> FeedStats {
        let posts = self.posts();
        FeedStats {
            posts: posts.len(),
            likes: posts.iter().map(|p| u64::from(p.likes)).sum(),
        }
    }
}
