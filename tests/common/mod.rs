// SPDX-License-Identifier: MIT

//! Shared fixtures: a scripted auth provider and an engine wired to the
//! in-memory store with a fast retry cadence.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sultan_session::auth::{AuthCallback, AuthEvents, AuthSubscription};
use sultan_session::retry::RetryPolicy;
use sultan_session::session::SessionState;
use sultan_session::{
    AuthProvider, AuthState, Identity, MemoryProfileStore, Profile, ProfileStore, Result,
    SessionEngine, SessionHandle,
};
use tokio::sync::watch;

/// Test auth provider: transitions are emitted by the test script; sign-out
/// calls are counted and emit `SignedOut` like the real provider.
#[derive(Default)]
pub struct ScriptedAuth {
    events: AuthEvents,
    sign_outs: AtomicU32,
}

impl ScriptedAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn emit_signed_in(&self, identity: Identity) {
        self.events.emit(&AuthState::SignedIn(identity));
    }

    pub fn emit_signed_out(&self) {
        self.events.emit(&AuthState::SignedOut);
    }

    pub fn sign_out_count(&self) -> u32 {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AuthProvider for ScriptedAuth {
    fn subscribe(&self, callback: AuthCallback) -> AuthSubscription {
        self.events.subscribe(callback)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.events.emit(&AuthState::SignedOut);
        Ok(())
    }
}

#[allow(dead_code)]
pub fn test_identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        display_name: Some("Test Sultan".to_string()),
        email: Some("sultan@example.com".to_string()),
    }
}

#[allow(dead_code)]
pub fn test_profile(uid: &str) -> Profile {
    Profile::for_new_identity(&test_identity(uid))
}

/// A running engine over scripted auth and the in-memory store.
pub struct TestSession {
    pub auth: Arc<ScriptedAuth>,
    pub store: Arc<MemoryProfileStore>,
    pub handle: SessionHandle,
}

/// Start an engine with `attempts` existence checks at a 10 ms cadence.
#[allow(dead_code)]
pub fn start_engine(attempts: u32) -> TestSession {
    let auth = ScriptedAuth::new();
    let store = Arc::new(MemoryProfileStore::new());
    let engine = SessionEngine::new(
        auth.clone(),
        store.clone(),
        RetryPolicy::new(attempts, Duration::from_millis(10)),
    );
    TestSession {
        auth,
        store,
        handle: engine.start(),
    }
}

/// Await the first snapshot satisfying `pred`, within two seconds.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut watch::Receiver<SessionState>, mut pred: F) -> SessionState
where
    F: FnMut(&SessionState) -> bool,
{
    let deadline = Duration::from_secs(2);
    tokio::time::timeout(deadline, async {
        loop {
            {
                let current = rx.borrow_and_update();
                if pred(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .expect("timed out waiting for session state")
}

/// Sign in against an already-created profile and wait until live.
#[allow(dead_code)]
pub async fn go_live(session: &TestSession, uid: &str) -> Profile {
    session
        .store
        .create(&test_profile(uid))
        .await
        .expect("create profile");
    session.auth.emit_signed_in(test_identity(uid));

    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, SessionState::is_active).await;
    state.profile().expect("active profile").clone()
}
