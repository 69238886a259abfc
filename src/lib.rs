// SPDX-License-Identifier: MIT

//! Sultan-Session: session and profile synchronization for the Sultan
//! membership portal.
//!
//! This crate reconciles local session state with an eventually-consistent
//! remote profile record across asynchronous auth transitions and live
//! document pushes. It covers:
//! - auth-state observation with revocable subscriptions
//! - profile resolution, including the first-login creation race
//! - live profile mirroring with a single-writer snapshot
//! - fire-and-forget field mutations (points, XP/level, flags)
//! - fail-open content moderation for the chat surface

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod moderation;
pub mod retry;
pub mod session;
pub mod store;

pub use auth::{AuthProvider, FirebaseAuth};
pub use config::Config;
pub use error::{Result, SessionError};
pub use models::{AuthState, Identity, Profile};
pub use session::{ProfileMutator, SessionEngine, SessionHandle, SessionState};
pub use store::{FirestoreProfileStore, MemoryProfileStore, ProfileStore};
