// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill-Tracker API Server
//!
//! Serves the skill, goal and feed stores to the frontend, backed by the
//! hosted tables and auth service (or in-memory tables in offline mode).

use skill_tracker::{config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        offline = config.offline,
        "Starting Skill-Tracker API"
    );
    if config.offline {
        tracing::warn!("Offline mode: data lives in memory and is lost on exit");
    }

    // Build shared state
    let state = Arc::new(AppState::from_config(config.clone())?);

    // Pick up a session left over from a previous run, if the backend has one.
    if let Some(identity) = state.stores.session.refresh_identity().await {
        tracing::info!(user_id = %identity.id, "Resumed session");
    }

    // Build router
    let app = skill_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skill_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
