//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; base URLs for the hosted
//! collaborators are overridable so tests can point them at local stubs.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID backing the Firestore profile store
    pub gcp_project_id: String,
    /// Firebase Web API key (public, identifies the project)
    pub firebase_api_key: String,
    /// Gemini API key for the moderation collaborator
    pub gemini_api_key: String,
    /// Existence-check attempts before a missing profile forces sign-out
    pub profile_retry_attempts: u32,
    /// Pause between existence checks
    pub profile_retry_interval: Duration,
    /// Override for the Firebase Auth REST endpoint
    pub auth_base_url: String,
    /// Override for the Gemini endpoint
    pub gemini_base_url: String,
}

const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            profile_retry_attempts: env::var("PROFILE_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            profile_retry_interval: Duration::from_millis(
                env::var("PROFILE_RETRY_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
            auth_base_url: env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_BASE_URL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            gemini_api_key: "test_gemini_key".to_string(),
            profile_retry_attempts: 5,
            profile_retry_interval: Duration::from_millis(10),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_API_KEY", "key_from_env");
        env::set_var("PROFILE_RETRY_ATTEMPTS", "3");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_api_key, "key_from_env");
        assert_eq!(config.profile_retry_attempts, 3);
        assert_eq!(config.profile_retry_interval, Duration::from_millis(1000));
    }
}
