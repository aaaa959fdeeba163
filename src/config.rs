//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Default request timeout against the hosted backend.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (e.g. `https://xyz.supabase.co`)
    pub backend_url: String,
    /// Public (anon) API key sent with every backend request
    pub backend_anon_key: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Per-request timeout for backend calls
    pub request_timeout_secs: u64,
    /// Serve from in-memory tables instead of the hosted backend
    pub offline: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline = env::var("OFFLINE_MODE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let (backend_url, backend_anon_key) = if offline {
            (
                env::var("SUPABASE_URL").unwrap_or_default(),
                env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            )
        } else {
            (
                env::var("SUPABASE_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
                env::var("SUPABASE_ANON_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            )
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS", raw))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            backend_url,
            backend_anon_key,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port,
            request_timeout_secs,
            offline,
        })
    }

    /// Offline config for tests.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            backend_anon_key: "test_anon_key".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            offline: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so everything lives in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("SUPABASE_URL", "https://example.supabase.co/");
        env::set_var("SUPABASE_ANON_KEY", " anon ");
        env::remove_var("OFFLINE_MODE");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.backend_url, "https://example.supabase.co");
        assert_eq!(config.backend_anon_key, "anon");
        assert_eq!(config.port, 8080);
        assert!(!config.offline);

        env::set_var("PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("PORT", _)));
        env::remove_var("PORT");

        env::remove_var("SUPABASE_URL");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));

        env::set_var("OFFLINE_MODE", "true");
        let config = Config::from_env().expect("Offline config should load");
        assert!(config.offline);
        env::remove_var("OFFLINE_MODE");
    }
}
