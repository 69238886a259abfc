//! Data models shared across the session engine.

pub mod identity;
pub mod profile;

pub use identity::{AuthState, Identity};
pub use profile::{apply_points, apply_xp, Profile, ProfileUpdate, Role, XpOutcome};
