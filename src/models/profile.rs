//! The durable per-user profile record and its mutation arithmetic.

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// XP required to clear one level is `level * 1000`.
const XP_PER_LEVEL: i64 = 1000;

/// Points granted to a freshly provisioned profile.
const STARTING_POINTS: i64 = 1000;

/// Membership tier. The exact tiers are presentation detail; the wire
/// strings match the stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Sultan,
    Admin,
}

/// User profile stored in Firestore (`users` collection, doc id = uid).
///
/// The in-memory copy is a cache: it is replaced wholesale on every push
/// from the live subscription and is never patched field-by-field locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth provider uid (also the document ID)
    pub uid: String,
    /// Display name
    pub name: String,
    /// Email or contact label (Telegram handle for widget logins)
    pub email: String,
    /// Spendable points, never negative
    pub points: i64,
    /// XP toward the next level, always `< level * 1000`
    pub xp: i64,
    /// Current level, starts at 1
    pub level: u32,
    pub role: Role,
    pub is_ghost_mode: bool,
    pub two_factor_enabled: bool,
    /// Milliseconds since the epoch; immutable once set
    pub joined_at: i64,
    /// Devotional counter, absent until first used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasbeeh_count: Option<i64>,
}

impl Profile {
    /// First-login profile for a freshly authenticated identity.
    pub fn for_new_identity(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            name: identity
                .display_name
                .clone()
                .unwrap_or_else(|| "سلطان جديد".to_string()),
            email: identity.email.clone().unwrap_or_default(),
            points: STARTING_POINTS,
            xp: 0,
            level: 1,
            role: Role::Member,
            is_ghost_mode: false,
            two_factor_enabled: false,
            joined_at: chrono::Utc::now().timestamp_millis(),
            tasbeeh_count: None,
        }
    }
}

/// Partial-write payload for the profile store.
///
/// Fields left `None` are not written; there is no multi-field transaction
/// guarantee across separate updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ghost_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasbeeh_count: Option<i64>,
}

impl ProfileUpdate {
    /// Document field paths set in this update.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.points.is_some() {
            paths.push("points");
        }
        if self.xp.is_some() {
            paths.push("xp");
        }
        if self.level.is_some() {
            paths.push("level");
        }
        if self.is_ghost_mode.is_some() {
            paths.push("is_ghost_mode");
        }
        if self.two_factor_enabled.is_some() {
            paths.push("two_factor_enabled");
        }
        if self.tasbeeh_count.is_some() {
            paths.push("tasbeeh_count");
        }
        paths
    }

    /// Apply this update to a profile copy. Used by the in-memory store;
    /// Firestore applies the same semantics server-side.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(points) = self.points {
            profile.points = points;
        }
        if let Some(xp) = self.xp {
            profile.xp = xp;
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(ghost) = self.is_ghost_mode {
            profile.is_ghost_mode = ghost;
        }
        if let Some(tfa) = self.two_factor_enabled {
            profile.two_factor_enabled = tfa;
        }
        if let Some(count) = self.tasbeeh_count {
            profile.tasbeeh_count = Some(count);
        }
    }
}

/// Result of applying an XP delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpOutcome {
    pub xp: i64,
    pub level: u32,
    /// Number of level boundaries crossed (0 if none)
    pub levels_gained: u32,
}

/// Apply an XP delta with modulo-carry level-ups.
///
/// Crossing `level * 1000` increments the level and carries the remainder
/// forward; a large delta may clear several levels in one call. The
/// invariant `xp < level * 1000` holds on return.
pub fn apply_xp(xp: i64, level: u32, delta: i64) -> XpOutcome {
    let mut xp = (xp + delta).max(0);
    let mut level = level.max(1);
    let mut levels_gained = 0;

    while xp >= i64::from(level) * XP_PER_LEVEL {
        xp -= i64::from(level) * XP_PER_LEVEL;
        level += 1;
        levels_gained += 1;
    }

    XpOutcome {
        xp,
        level,
        levels_gained,
    }
}

/// Apply a points delta, clamped so the balance never goes negative.
pub fn apply_points(points: i64, delta: i64) -> i64 {
    (points + delta).max(0)
}
