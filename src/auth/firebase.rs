// SPDX-License-Identifier: MIT

//! Firebase Auth REST client (Identity Toolkit v1).
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - Anonymous sign-in (Telegram widget logins land here)
//! - First-login profile provisioning
//! - Provider error-code mapping
//!
//! Successful transitions are pushed to subscribers through [`AuthEvents`];
//! the engine never polls.

use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::auth::{AuthCallback, AuthEvents, AuthProvider, AuthSubscription};
use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::models::{AuthState, Identity, Profile};
use crate::store::ProfileStore;

/// Firebase Auth client.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    events: AuthEvents,
    store: Arc<dyn ProfileStore>,
    current: Mutex<Option<Identity>>,
}

impl FirebaseAuth {
    /// Create a new client. The store is needed only for first-login
    /// profile provisioning; the client never updates existing profiles.
    pub fn new(config: &Config, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.auth_base_url.clone(),
            api_key: config.firebase_api_key.clone(),
            events: AuthEvents::new(),
            store,
            current: Mutex::new(None),
        }
    }

    /// Sign in with an existing email/password account.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let account: AccountResponse = self.post_json("accounts:signInWithPassword", &body).await?;

        let identity = account.into_identity();
        self.enter_session(identity.clone());
        Ok(identity)
    }

    /// Create an email/password account and provision its profile.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Identity> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let account: AccountResponse = self.post_json("accounts:signUp", &body).await?;

        let mut identity = account.into_identity();
        identity.display_name = Some(name.to_string());

        self.provision_profile(&identity).await?;
        self.enter_session(identity.clone());
        Ok(identity)
    }

    /// Anonymous sign-in, used by widget flows that bring their own display
    /// name and contact label (e.g. a Telegram handle).
    pub async fn sign_in_anonymously(&self, name: &str, contact: &str) -> Result<Identity> {
        let body = serde_json::json!({ "returnSecureToken": true });
        let account: AccountResponse = self.post_json("accounts:signUp", &body).await?;

        let identity = Identity {
            uid: account.local_id,
            display_name: Some(name.to_string()),
            email: Some(contact.to_string()),
        };

        self.provision_profile(&identity).await?;
        self.enter_session(identity.clone());
        Ok(identity)
    }

    /// Write the first-login profile record if none exists yet. This is the
    /// write that concurrent sessions' existence checks wait on.
    async fn provision_profile(&self, identity: &Identity) -> Result<()> {
        if self.store.get(&identity.uid).await?.is_none() {
            let profile = Profile::for_new_identity(identity);
            self.store.create(&profile).await?;
            tracing::info!(uid = %identity.uid, "Provisioned first-login profile");
        }
        Ok(())
    }

    fn enter_session(&self, identity: Identity) {
        tracing::info!(uid = %identity.uid, "Signed in");
        *self.current.lock().expect("auth state lock") = Some(identity.clone());
        self.events.emit(&AuthState::SignedIn(identity));
    }

    /// Generic POST against the Identity Toolkit API.
    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}/{}?key={}", self.base_url, method, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Auth(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status, mapping provider error codes, then parse JSON.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Auth(map_provider_error(&body, status)));
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::Auth(format!("JSON parse error: {}", e)))
    }
}

#[async_trait::async_trait]
impl AuthProvider for FirebaseAuth {
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription {
        self.events.subscribe(callback)
    }

    async fn sign_out(&self) -> Result<()> {
        let previous = self.current.lock().expect("auth state lock").take();
        match previous {
            Some(identity) => tracing::info!(uid = %identity.uid, "Signed out"),
            None => tracing::debug!("Sign-out with no active session"),
        }
        self.events.emit(&AuthState::SignedOut);
        Ok(())
    }
}

/// Identity Toolkit account payload (shared by sign-in and sign-up).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl AccountResponse {
    fn into_identity(self) -> Identity {
        Identity {
            uid: self.local_id,
            display_name: self.display_name.filter(|n| !n.is_empty()),
            email: self.email.filter(|e| !e.is_empty()),
        }
    }
}

/// Error envelope returned by the Identity Toolkit API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Map the provider's error codes to user-presentable messages.
fn map_provider_error(body: &str, status: reqwest::StatusCode) -> String {
    let code = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_default();

    match code.split(':').next().unwrap_or_default().trim() {
        "EMAIL_EXISTS" => "email already in use".to_string(),
        "INVALID_EMAIL" => "invalid email address".to_string(),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "wrong email or password".to_string()
        }
        "" => format!("HTTP {}: {}", status, body),
        other => format!("provider error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_provider_codes() {
        let body = r#"{"error":{"message":"EMAIL_EXISTS","code":400}}"#;
        assert_eq!(
            map_provider_error(body, reqwest::StatusCode::BAD_REQUEST),
            "email already in use"
        );

        let body = r#"{"error":{"message":"INVALID_LOGIN_CREDENTIALS","code":400}}"#;
        assert_eq!(
            map_provider_error(body, reqwest::StatusCode::BAD_REQUEST),
            "wrong email or password"
        );
    }

    #[test]
    fn unknown_codes_fall_through_with_status() {
        let msg = map_provider_error("not json", reqwest::StatusCode::BAD_GATEWAY);
        assert!(msg.starts_with("HTTP 502"));
    }
}
