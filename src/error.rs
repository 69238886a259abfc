// SPDX-License-Identifier: MIT

//! Session error types and the crate-wide result alias.

/// Errors produced by the session engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The auth provider rejected a credential or request.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The profile store could not be reached or rejected an operation.
    #[error("Profile store error: {0}")]
    Store(String),

    /// An identity authenticated but its backing profile never appeared
    /// within the retry ceiling. The session must not proceed.
    #[error("No profile record for uid {0} after retry ceiling")]
    ProfileMissing(String),

    /// A mutation was issued while no profile snapshot is active.
    #[error("No active session")]
    NotSignedIn,

    /// The moderation collaborator failed; callers normally never see this
    /// because verdicts fail open, but the raw request path reports it.
    #[error("Moderation request failed: {0}")]
    Moderation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionError>;
