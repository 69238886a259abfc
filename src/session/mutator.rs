// SPDX-License-Identifier: MIT

//! Fire-and-forget profile mutations.
//!
//! Each operation is an isolated partial write against the remote record:
//! read whatever snapshot is current, compute the new field values, write
//! them absolutely. The local snapshot is never touched here; effects become
//! visible only through the next live-subscription push.
//!
//! Reads may be momentarily stale, so adjustments issued in the same tick
//! can lose updates. That weak consistency is the documented contract of
//! the original system, not something this layer papers over.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Result, SessionError};
use crate::models::{apply_points, apply_xp, Profile, ProfileUpdate};
use crate::session::SessionState;
use crate::store::ProfileStore;

/// Invoked with the new level when an XP write crosses a level boundary.
pub type LevelUpHook = Arc<dyn Fn(u32) + Send + Sync>;

/// Issues field-level profile commands against the store.
pub struct ProfileMutator {
    store: Arc<dyn ProfileStore>,
    state: watch::Receiver<SessionState>,
    level_up_hook: Option<LevelUpHook>,
}

impl ProfileMutator {
    pub fn new(store: Arc<dyn ProfileStore>, state: watch::Receiver<SessionState>) -> Self {
        Self {
            store,
            state,
            level_up_hook: None,
        }
    }

    /// Attach a notification hook for level-ups.
    pub fn with_level_up_hook(mut self, hook: LevelUpHook) -> Self {
        self.level_up_hook = Some(hook);
        self
    }

    /// The profile snapshot active at call time. Stale reads are accepted.
    fn current(&self) -> Result<Profile> {
        match &*self.state.borrow() {
            SessionState::Active(profile) => Ok(profile.clone()),
            _ => Err(SessionError::NotSignedIn),
        }
    }

    /// Add or remove points; the balance never goes below zero.
    pub async fn adjust_points(&self, delta: i64) -> Result<()> {
        let profile = self.current()?;
        let update = ProfileUpdate {
            points: Some(apply_points(profile.points, delta)),
            ..Default::default()
        };
        self.store.update_fields(&profile.uid, &update).await
    }

    /// Grant XP, carrying remainders across level boundaries. The level-up
    /// hook fires once the write is accepted, with the final level.
    pub async fn adjust_xp(&self, delta: i64) -> Result<()> {
        let profile = self.current()?;
        let outcome = apply_xp(profile.xp, profile.level, delta);
        let update = ProfileUpdate {
            xp: Some(outcome.xp),
            level: Some(outcome.level),
            ..Default::default()
        };
        self.store.update_fields(&profile.uid, &update).await?;

        if outcome.levels_gained > 0 {
            tracing::info!(uid = %profile.uid, level = outcome.level, "Level up");
            if let Some(hook) = &self.level_up_hook {
                hook(outcome.level);
            }
        }
        Ok(())
    }

    /// Flip ghost mode. No validation.
    pub async fn toggle_ghost_mode(&self) -> Result<()> {
        let profile = self.current()?;
        let update = ProfileUpdate {
            is_ghost_mode: Some(!profile.is_ghost_mode),
            ..Default::default()
        };
        self.store.update_fields(&profile.uid, &update).await
    }

    /// Set the two-factor flag from the security panel.
    pub async fn set_two_factor(&self, enabled: bool) -> Result<()> {
        let profile = self.current()?;
        let update = ProfileUpdate {
            two_factor_enabled: Some(enabled),
            ..Default::default()
        };
        self.store.update_fields(&profile.uid, &update).await
    }

    /// Bump the devotional counter by one.
    pub async fn increment_tasbeeh(&self) -> Result<()> {
        let profile = self.current()?;
        let update = ProfileUpdate {
            tasbeeh_count: Some(profile.tasbeeh_count.unwrap_or(0) + 1),
            ..Default::default()
        };
        self.store.update_fields(&profile.uid, &update).await
    }
}
