//! Authenticated-identity handle and observable auth states.

use serde::{Deserialize, Serialize};

/// Transient handle for an authenticated user, owned by the auth provider.
/// Held only for the duration of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique identifier issued by the provider
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// The two observable authentication states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn(Identity),
}
