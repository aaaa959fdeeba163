// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;
use skill_tracker::config::Config;
use skill_tracker::db::MemoryTables;
use skill_tracker::routes::create_router;
use skill_tracker::services::MemoryAuth;
use skill_tracker::store::Stores;
use skill_tracker::AppState;
use std::sync::Arc;

/// In-memory backend shared by the stores under test.
#[allow(dead_code)]
pub struct TestBackend {
    pub tables: MemoryTables,
    pub auth: Arc<MemoryAuth>,
}

#[allow(dead_code)]
impl TestBackend {
    pub fn new() -> Self {
        let tables = MemoryTables::new();
        let auth = Arc::new(MemoryAuth::new(tables.clone()));
        Self { tables, auth }
    }

    pub fn stores(&self) -> Stores {
        Stores::new(self.auth.clone(), Arc::new(self.tables.clone()))
    }
}

/// Stores over a fresh in-memory backend, already signed in as `user@example.com`.
#[allow(dead_code)]
pub async fn signed_in_stores() -> (Stores, TestBackend) {
    let backend = TestBackend::new();
    let stores = backend.stores();
    assert!(
        stores
            .session
            .sign_up("user@example.com", "password", "Test User")
            .await,
        "sign-up failed: {:?}",
        stores.session.snapshot().error
    );
    (stores, backend)
}

/// Create a test app over an in-memory backend.
/// Returns the router, the shared state and the backend handles.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestBackend) {
    let backend = TestBackend::new();
    let state = Arc::new(AppState {
        config: Config::test_default(),
        stores: backend.stores(),
    });
    (create_router(state.clone()), state, backend)
}

/// Test app with a signed-in user.
#[allow(dead_code)]
pub async fn create_signed_in_app() -> (axum::Router, Arc<AppState>, TestBackend) {
    let (app, state, backend) = create_test_app();
    assert!(
        state
            .stores
            .session
            .sign_up("user@example.com", "password", "Test User")
            .await
    );
    (app, state, backend)
}

/// Build a JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a body-less request.
#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
