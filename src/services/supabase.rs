// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the hosted backend (auth + REST table API).
//!
//! Handles:
//! - Sign-up, password sign-in and sign-out against the auth endpoints
//! - Holding the current session so table requests carry its token
//! - Mapping HTTP failures onto [`AppError`] with the backend's message

use crate::error::AppError;
use crate::models::Session;
use crate::services::auth::AuthService;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Shared slot holding the signed-in session, if any.
pub type SessionSlot = Arc<RwLock<Option<Session>>>;

/// Backend client. Cheap to clone; clones share the HTTP pool and session.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: SessionSlot,
}

impl SupabaseClient {
    /// Create a client for `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// URL of a table on the REST endpoint.
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Current access token, falling back to the anon key when signed out.
    fn bearer_token(&self) -> String {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Attach the API key and bearer token every backend call needs.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token())
    }

    /// Check response status and return error if not successful.
    pub(crate) async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        match status.as_u16() {
            401 => {
                tracing::warn!(message = %message, "Backend rejected session token");
                Err(AppError::Backend(AppError::SESSION_EXPIRED.to_string()))
            }
            404 => Err(AppError::NotFound(message)),
            429 => {
                tracing::warn!("Backend rate limit hit (429)");
                Err(AppError::Backend(AppError::BACKEND_RATE_LIMIT.to_string()))
            }
            _ => Err(AppError::Backend(format!("HTTP {}: {}", status.as_u16(), message))),
        }
    }

    /// Check response and parse JSON body.
    pub(crate) async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        self.check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }

    async fn post_auth(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let response = self
            .authorize(self.http.post(self.auth_url(path)))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }
}

/// Pull a human-readable message out of an auth or REST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Session>, AppError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": {
                "full_name": display_name,
                "subscription_tier": "free",
            },
        });

        let json = self.post_auth("signup", &body).await?;

        // Without auto-confirm the backend answers with a bare user and no session.
        if json.get("access_token").is_none() {
            tracing::info!("Sign-up accepted, awaiting e-mail confirmation");
            return Ok(None);
        }

        let session = serde_json::from_value::<Session>(json)
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))?
            .with_absolute_expiry(Utc::now());
        self.store_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let json = self.post_auth("token?grant_type=password", &body).await?;

        let session = serde_json::from_value::<Session>(json)
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))?
            .with_absolute_expiry(Utc::now());
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let had_session = self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if !had_session {
            return Ok(());
        }

        let result = match self
            .authorize(self.http.post(self.auth_url("logout")))
            .send()
            .await
        {
            Ok(response) => self.check_response(response).await.map(|_| ()),
            Err(e) => Err(AppError::Backend(e.to_string())),
        };

        // The token is the only session state; drop it whatever the backend said.
        self.store_session(None);
        result
    }

    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        let session = self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match session {
            Some(s) if s.is_expired(Utc::now()) => {
                tracing::info!(user_id = %s.user.id, "Stored session expired");
                self.store_session(None);
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_fields() {
        assert_eq!(
            error_message(r#"{"code":"PGRST301","message":"JWT expired"}"#),
            "JWT expired"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message("upstream timeout\n"), "upstream timeout");
    }

    #[test]
    fn test_urls() {
        let client =
            SupabaseClient::new("https://example.supabase.co/", "anon", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.rest_url("goals"),
            "https://example.supabase.co/rest/v1/goals"
        );
        assert_eq!(
            client.auth_url("logout"),
            "https://example.supabase.co/auth/v1/logout"
        );
        assert_eq!(client.bearer_token(), "anon");
    }
}
