// SPDX-License-Identifier: MIT

//! Subscriber registry for auth-state transitions.
//!
//! Providers emit into the hub; each subscriber holds a revocable handle.
//! Cancellation is idempotent and also happens on drop, so a subscriber can
//! never be invoked against a discarded session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::auth::AuthCallback;
use crate::models::AuthState;

/// Fan-out hub for auth-state transitions.
#[derive(Clone, Default)]
pub struct AuthEvents {
    subscribers: Arc<DashMap<u64, AuthCallback>>,
    next_id: Arc<AtomicU64>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; the handle controls its lifetime.
    pub fn subscribe(&self, callback: AuthCallback) -> AuthSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, callback);
        AuthSubscription {
            id,
            subscribers: Arc::clone(&self.subscribers),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Deliver a transition to every live subscriber. Emission never
    /// mutates any profile.
    pub fn emit(&self, state: &AuthState) {
        for entry in self.subscribers.iter() {
            (entry.value())(state.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Revocable handle for one auth-state subscription.
pub struct AuthSubscription {
    id: u64,
    subscribers: Arc<DashMap<u64, AuthCallback>>,
    cancelled: AtomicBool,
}

impl AuthSubscription {
    /// Stop delivery. Idempotent: repeated calls and cancel-during-drop are
    /// both no-ops after the first.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.subscribers.remove(&self.id);
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use std::sync::atomic::AtomicU32;

    fn identity() -> Identity {
        Identity {
            uid: "u1".into(),
            display_name: None,
            email: None,
        }
    }

    #[test]
    fn emits_to_live_subscribers() {
        let hub = AuthEvents::new();
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        let _sub = hub.subscribe(Box::new(move |_| {
            seen2.fetch_add(1, Ordering::SeqCst);
        }));

        hub.emit(&AuthState::SignedIn(identity()));
        hub.emit(&AuthState::SignedOut);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cancel_is_idempotent_and_silences_callbacks() {
        let hub = AuthEvents::new();
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        let sub = hub.subscribe(Box::new(move |_| {
            seen2.fetch_add(1, Ordering::SeqCst);
        }));

        sub.cancel();
        sub.cancel();
        hub.emit(&AuthState::SignedOut);

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn drop_revokes_subscription() {
        let hub = AuthEvents::new();
        {
            let _sub = hub.subscribe(Box::new(|_| {}));
            assert_eq!(hub.subscriber_count(), 1);
        }
        assert_eq!(hub.subscriber_count(), 0);
    }
}
