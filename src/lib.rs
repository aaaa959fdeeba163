// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Skill-Tracker: track skills, progress and goals against a hosted backend
//!
//! This crate keeps client-side stores of the signed-in user's skills,
//! goals and feed in step with the backend's tables, and serves them to
//! the frontend as a local JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use db::{MemoryTables, RestTables};
use error::AppError;
use services::{MemoryAuth, SupabaseClient};
use std::sync::Arc;
use std::time::Duration;
use store::Stores;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
}

impl AppState {
    /// Build the stores against the hosted backend, or against in-memory
    /// tables when `config.offline` is set.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let stores = if config.offline {
            let tables = MemoryTables::new();
            let auth = Arc::new(MemoryAuth::new(tables.clone()));
            Stores::new(auth, Arc::new(tables))
        } else {
            let client = SupabaseClient::new(
                &config.backend_url,
                &config.backend_anon_key,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            let tables = Arc::new(RestTables::new(client.clone()));
            Stores::new(Arc::new(client), tables)
        };

        Ok(Self { config, stores })
    }
}
