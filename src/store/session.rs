// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: who is signed in, and the profile that goes with it.
//!
//! The identity is always reloaded from the `profiles` table after the
//! auth service hands out a session; the sign-in response itself is never
//! treated as the profile.

use crate::db::TableService;
use crate::error::AppError;
use crate::models::{Identity, Session};
use crate::services::auth::{load_profile, AuthService};
use crate::store::cell::{Snapshot, StoreCell};
use crate::store::sync::decode_row;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    SignedOut,
    SigningUp,
    SigningIn,
    SignedIn,
    SigningOut,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub identity: Option<Identity>,
    #[serde(skip)]
    pub session: Option<Session>,
    pub phase: SessionPhase,
    /// Sign-up succeeded but the account must be confirmed by e-mail first.
    pub pending_confirmation: bool,
}

impl SessionState {
    fn signed_out() -> Self {
        Self::default()
    }

    /// Clear the identity after a failed reload. The session goes too if
    /// the backend no longer accepts it.
    fn lose_identity(&mut self, err: &AppError) {
        self.identity = None;
        self.phase = SessionPhase::SignedOut;
        if err.is_auth_error() {
            tracing::info!("Backend rejected the session, dropping it");
            self.session = None;
        }
    }

    /// Leave the transient `phase` for the one the settled fields imply.
    /// Another operation may already have moved the phase on.
    fn leave(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            self.phase = if self.identity.is_some() {
                SessionPhase::SignedIn
            } else {
                SessionPhase::SignedOut
            };
        }
    }
}

pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    tables: Arc<dyn TableService>,
    cell: StoreCell<SessionState>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthService>, tables: Arc<dyn TableService>) -> Self {
        Self {
            auth,
            tables,
            cell: StoreCell::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> Snapshot<SessionState> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<SessionState>> {
        self.cell.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.cell.read(|state| state.identity.clone())
    }

    pub fn phase(&self) -> SessionPhase {
        self.cell.read(|state| state.phase)
    }

    pub fn is_signed_in(&self) -> bool {
        self.cell
            .read(|state| state.phase == SessionPhase::SignedIn && state.identity.is_some())
    }

    pub fn reset(&self) {
        self.cell.reset();
    }

    async fn fetch_identity(&self, session: &Session) -> Result<Identity, AppError> {
        let row = load_profile(self.tables.as_ref(), &session.user.id).await?;
        decode_row(crate::db::collections::PROFILES, row)
    }

    /// Finish a sign-in/sign-up: load the profile for `session` and settle.
    fn settle_with_identity(
        op: crate::store::cell::Operation<'_, SessionState>,
        session: Session,
        identity: Result<Identity, AppError>,
    ) -> bool {
        match identity {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "Signed in");
                op.succeed(move |state| {
                    state.identity = Some(identity);
                    state.session = Some(session);
                    state.phase = SessionPhase::SignedIn;
                    state.pending_confirmation = false;
                });
                true
            }
            Err(e) => {
                // Keep a session the backend still accepts so a later
                // refresh can recover.
                let session = (!e.is_auth_error()).then_some(session);
                op.fail_with(&e, move |state| {
                    state.identity = None;
                    state.session = session;
                    state.phase = SessionPhase::SignedOut;
                });
                false
            }
        }
    }

    /// Create an account. Returns true once the user is signed in; an
    /// account awaiting e-mail confirmation returns false with
    /// `pending_confirmation` set and no error.
    ///
    /// A failed or cancelled sign-up leaves any existing identity alone.
    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> bool {
        let mut op = self.cell.begin("sign_up");
        op.stage(
            |state| state.phase = SessionPhase::SigningUp,
            |state| state.leave(SessionPhase::SigningUp),
        );

        match self.auth.sign_up(email, password, display_name).await {
            Ok(Some(session)) => {
                let identity = self.fetch_identity(&session).await;
                Self::settle_with_identity(op, session, identity)
            }
            Ok(None) => {
                tracing::info!("Account created, awaiting e-mail confirmation");
                op.succeed(|state| {
                    state.pending_confirmation = true;
                    state.leave(SessionPhase::SigningUp);
                });
                false
            }
            Err(e) => {
                op.fail_with(&e, |state| state.leave(SessionPhase::SigningUp));
                false
            }
        }
    }

    /// Sign in. A failed or cancelled attempt leaves any existing identity alone.
    pub async fn sign_in(&self, email: &str, password: &str) -> bool {
        let mut op = self.cell.begin("sign_in");
        op.stage(
            |state| state.phase = SessionPhase::SigningIn,
            |state| state.leave(SessionPhase::SigningIn),
        );

        match self.auth.sign_in(email, password).await {
            Ok(session) => {
                let identity = self.fetch_identity(&session).await;
                Self::settle_with_identity(op, session, identity)
            }
            Err(e) => {
                op.fail_with(&e, |state| state.leave(SessionPhase::SigningIn));
                false
            }
        }
    }

    /// Sign out. Local state is cleared whatever the remote call reports,
    /// even if the call is cancelled; a remote failure is still recorded
    /// in `error`.
    pub async fn sign_out(&self) -> bool {
        let mut op = self.cell.begin("sign_out");
        op.stage(
            |state| state.phase = SessionPhase::SigningOut,
            |state| *state = SessionState::signed_out(),
        );

        let result = self.auth.sign_out().await;
        match result {
            Ok(()) => {
                tracing::info!("Signed out");
                op.succeed(|state| *state = SessionState::signed_out());
                true
            }
            Err(e) => {
                op.fail_with(&e, |state| *state = SessionState::signed_out());
                false
            }
        }
    }

    /// Reload the identity for the auth service's current session.
    ///
    /// With no session the store settles signed out; if the profile cannot
    /// be loaded the identity is cleared and the failure recorded.
    pub async fn refresh_identity(&self) -> Option<Identity> {
        let op = self.cell.begin("refresh_identity");

        let session = match self.auth.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                op.succeed(|state| *state = SessionState::signed_out());
                return None;
            }
            Err(e) => {
                op.fail_with(&e, |state| state.lose_identity(&e));
                return None;
            }
        };

        match self.fetch_identity(&session).await {
            Ok(identity) => {
                let loaded = identity.clone();
                op.succeed(move |state| {
                    state.identity = Some(identity);
                    state.session = Some(session);
                    state.phase = SessionPhase::SignedIn;
                });
                Some(loaded)
            }
            Err(e) => {
                op.fail_with(&e, |state| state.lose_identity(&e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTables;
    use crate::services::auth::MemoryAuth;

    fn store() -> (SessionStore, Arc<MemoryAuth>, MemoryTables) {
        let tables = MemoryTables::new();
        let auth = Arc::new(MemoryAuth::new(tables.clone()));
        let store = SessionStore::new(auth.clone(), Arc::new(tables.clone()));
        (store, auth, tables)
    }

    #[tokio::test]
    async fn test_phase_is_visible_while_signing_in() {
        let (store, auth, _tables) = store();
        auth.sign_up("a@example.com", "pw", "A").await.unwrap();
        auth.sign_out().await.unwrap();

        let mut rx = store.subscribe();
        let signed_in = store.sign_in("a@example.com", "pw").await;
        assert!(signed_in);

        // The receiver saw at least one snapshot; the latest is signed in.
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.data.phase, SessionPhase::SignedIn);
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn test_missing_profile_leaves_user_signed_out() {
        let (store, auth, tables) = store();
        auth.sign_up("a@example.com", "pw", "A").await.unwrap();
        auth.sign_out().await.unwrap();

        tables.fail_next("profiles unavailable");
        assert!(!store.sign_in("a@example.com", "pw").await);

        let snap = store.snapshot();
        assert!(snap.data.identity.is_none());
        assert!(snap.data.session.is_some());
        assert_eq!(snap.data.phase, SessionPhase::SignedOut);
        assert!(snap.error.unwrap().contains("profiles unavailable"));
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_signed_out() {
        let (store, _auth, _tables) = store();
        assert!(store.refresh_identity().await.is_none());
        let snap = store.snapshot();
        assert_eq!(snap.data.phase, SessionPhase::SignedOut);
        assert_eq!(snap.error, None);
    }
}
