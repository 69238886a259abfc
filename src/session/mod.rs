// SPDX-License-Identifier: MIT

//! Session lifecycle: auth-driven profile resolution, live mirroring, and
//! fire-and-forget profile mutations.

mod engine;
mod mutator;

pub use engine::{SessionEngine, SessionHandle};
pub use mutator::{LevelUpHook, ProfileMutator};

use crate::models::{Identity, Profile};

/// The published session snapshot.
///
/// `Loading` never outlives initialization: resolution always terminates in
/// `Active` or `SignedOut`, so observers can never be left on an indefinite
/// spinner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Process start, before the first auth transition arrives
    Initializing,
    SignedOut,
    /// Identity authenticated, profile resolution in progress
    Loading(Identity),
    /// Live session; the profile mirrors the remote record
    Active(Profile),
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Active(profile) => Some(profile),
            _ => None,
        }
    }
}
