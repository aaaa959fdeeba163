// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend clients and business logic.

pub mod auth;
pub mod dashboard;
pub mod supabase;

pub use auth::{AuthService, MemoryAuth};
pub use dashboard::{ActivityItem, ActivityKind, DashboardSummary};
pub use supabase::SupabaseClient;
