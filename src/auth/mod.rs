// SPDX-License-Identifier: MIT

//! Authentication collaborator: push-based state observation and sign-out.

mod events;
mod firebase;

pub use events::{AuthEvents, AuthSubscription};
pub use firebase::FirebaseAuth;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::AuthState;

/// Callback invoked on every authentication-state transition.
pub type AuthCallback = Box<dyn Fn(AuthState) + Send + Sync>;

/// The hosted auth provider, narrowed to what the session engine consumes.
///
/// Subscriptions are push-driven; the provider never mutates profiles.
/// `sign_out` is fire-and-forget and idempotent.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Arm a callback for every subsequent state transition. The returned
    /// handle revokes delivery; revocation is idempotent.
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription;

    /// End the current session at the provider. Safe to call when already
    /// signed out.
    async fn sign_out(&self) -> Result<()>;
}
