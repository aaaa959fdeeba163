// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication service seam and an in-process implementation.

use crate::db::{collections, MemoryTables, TableService};
use crate::error::AppError;
use crate::models::{Session, SessionUser};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session lifetime handed out by [`MemoryAuth`].
const MEMORY_SESSION_SECS: i64 = 60 * 60;

/// Sign-up / sign-in / sign-out against the hosted auth service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register an account. Returns `None` when the account still needs
    /// e-mail confirmation before a session is issued.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Session>, AppError>;

    /// Password sign-in.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;

    /// End the current session. The local token is dropped even on failure.
    async fn sign_out(&self) -> Result<(), AppError>;

    /// Current unexpired session, if any.
    async fn current_session(&self) -> Result<Option<Session>, AppError>;
}

struct Account {
    user_id: String,
    password: String,
}

/// In-process accounts for offline mode and tests.
///
/// Sign-up writes the `profiles` row, and sign-in makes the signed-in
/// user the owner of new rows in the shared [`MemoryTables`].
pub struct MemoryAuth {
    tables: MemoryTables,
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    failures: Mutex<VecDeque<String>>,
    require_confirmation: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryAuth {
    pub fn new(tables: MemoryTables) -> Self {
        Self {
            tables,
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            failures: Mutex::new(VecDeque::new()),
            require_confirmation: false,
        }
    }

    /// Behave like a backend that withholds sessions until e-mail confirmation.
    pub fn requiring_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Make the next auth call fail with a backend error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        lock(&self.failures).push_back(message.to_string());
    }

    fn take_failure(&self) -> Result<(), AppError> {
        match lock(&self.failures).pop_front() {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    fn open_session(&self, user_id: &str, email: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_in: Some(MEMORY_SESSION_SECS),
            expires_at: Some(now.timestamp() + MEMORY_SESSION_SECS),
            user: SessionUser {
                id: user_id.to_string(),
                email: Some(email.to_string()),
            },
        };
        self.tables.set_owner(Some(user_id.to_string()));
        *lock(&self.session) = Some(session.clone());
        session
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Session>, AppError> {
        self.take_failure()?;

        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "E-mail and password are required".to_string(),
            ));
        }

        let user_id = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&email) {
                return Err(AppError::BadRequest("User already registered".to_string()));
            }
            let user_id = uuid::Uuid::new_v4().to_string();
            accounts.insert(
                email.clone(),
                Account {
                    user_id: user_id.clone(),
                    password: password.to_string(),
                },
            );
            user_id
        };

        self.tables.seed(
            collections::PROFILES,
            vec![serde_json::json!({
                "id": user_id,
                "email": email,
                "full_name": display_name,
                "avatar_url": null,
                "created_at": now_rfc3339(),
                "subscription_tier": "free",
            })],
        );
        tracing::info!(user_id = %user_id, "Account created");

        if self.require_confirmation {
            return Ok(None);
        }
        Ok(Some(self.open_session(&user_id, &email)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.take_failure()?;

        let email = email.trim().to_lowercase();
        let user_id = lock(&self.accounts)
            .get(&email)
            .filter(|account| account.password == password)
            .map(|account| account.user_id.clone())
            .ok_or_else(|| AppError::BadRequest("Invalid login credentials".to_string()))?;

        Ok(self.open_session(&user_id, &email))
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let result = self.take_failure();
        *lock(&self.session) = None;
        self.tables.set_owner(None);
        result
    }

    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        self.take_failure()?;

        let mut session = lock(&self.session);
        if session.as_ref().is_some_and(|s| s.is_expired(Utc::now())) {
            *session = None;
            self.tables.set_owner(None);
        }
        Ok(session.clone())
    }
}

/// Look up the profile row for a session user, expecting exactly one.
pub(crate) async fn load_profile(
    tables: &dyn TableService,
    user_id: &str,
) -> Result<serde_json::Value, AppError> {
    let query = crate::db::TableQuery::new().eq("id", user_id);
    let mut rows = tables.select(collections::PROFILES, &query).await?;
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(AppError::NotFound(format!("Profile {} not found", user_id))),
        n => Err(AppError::Database(format!(
            "Expected one profile for {}, found {}",
            user_id, n
        ))),
    }
}
