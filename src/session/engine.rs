// SPDX-License-Identifier: MIT

//! The session engine: reconciles local session state with the remote
//! profile record across auth transitions and live store pushes.
//!
//! Per session the lifecycle is
//! `Idle -> Checking -> {Retrying <-> Checking} -> Live -> Torn-down`,
//! with a forced sign-out when the profile never appears within the retry
//! ceiling, and teardown from any state on sign-out or fatal store error.
//!
//! The engine task is the only writer of the published snapshot; mutations
//! elsewhere become visible solely through the live subscription round-trip.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthProvider, AuthSubscription};
use crate::config::Config;
use crate::error::Result;
use crate::models::{AuthState, Identity, Profile};
use crate::retry::RetryPolicy;
use crate::session::SessionState;
use crate::store::{ProfileStore, ProfileWatch};

/// Builds and starts session lifecycles.
pub struct SessionEngine {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn ProfileStore>,
    retry: RetryPolicy,
}

impl SessionEngine {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn ProfileStore>, retry: RetryPolicy) -> Self {
        Self { auth, store, retry }
    }

    /// Engine with the retry ceiling and cadence taken from configuration.
    pub fn from_config(
        config: &Config,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        Self::new(
            auth,
            store,
            RetryPolicy::new(config.profile_retry_attempts, config.profile_retry_interval),
        )
    }

    /// Arm the auth subscription and spawn the reconciliation task.
    pub fn start(self) -> SessionHandle {
        let (state_tx, state_rx) = watch::channel(SessionState::Initializing);
        let (auth_tx, auth_rx) = mpsc::unbounded_channel();

        // Bridge push callbacks into the engine task's event queue; the
        // provider delivers transitions in emission order.
        let auth_sub = self.auth.subscribe(Box::new(move |state| {
            let _ = auth_tx.send(state);
        }));

        let shutdown = CancellationToken::new();
        tokio::spawn(run_session_loop(
            auth_rx,
            state_tx,
            self.auth,
            self.store,
            self.retry,
            shutdown.clone(),
        ));

        SessionHandle {
            state_rx,
            shutdown,
            auth_sub,
        }
    }
}

/// Handle for one running engine.
pub struct SessionHandle {
    state_rx: watch::Receiver<SessionState>,
    shutdown: CancellationToken,
    auth_sub: AuthSubscription,
}

impl SessionHandle {
    /// A receiver over the published session snapshots.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Tear the session down: revoke the auth subscription and stop the
    /// engine task, which releases any live watch. Idempotent; also runs on
    /// drop. No snapshot is published after teardown completes.
    pub fn shutdown(&self) {
        self.auth_sub.cancel();
        self.shutdown.cancel();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_session_loop(
    mut auth_rx: mpsc::UnboundedReceiver<AuthState>,
    state_tx: watch::Sender<SessionState>,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn ProfileStore>,
    retry: RetryPolicy,
    shutdown: CancellationToken,
) {
    let mut live: Option<ProfileWatch> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            event = auth_rx.recv() => match event {
                None => break,
                Some(AuthState::SignedOut) => {
                    release(&mut live);
                    let _ = state_tx.send(SessionState::SignedOut);
                }
                Some(AuthState::SignedIn(identity)) => {
                    // A new identity supersedes any live session
                    release(&mut live);
                    let _ = state_tx.send(SessionState::Loading(identity.clone()));

                    let resolved = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        r = resolve_profile(store.as_ref(), &identity, retry) => r,
                    };

                    match resolved {
                        Ok(Some(profile)) => match store.subscribe(&identity.uid).await {
                            Ok(watch) => {
                                live = Some(watch);
                                let _ = state_tx.send(SessionState::Active(profile));
                                tracing::info!(uid = %identity.uid, "Session live");
                            }
                            Err(e) => {
                                tracing::error!(uid = %identity.uid, error = %e, "Subscription failed");
                                let _ = state_tx.send(SessionState::SignedOut);
                            }
                        },
                        Ok(None) => {
                            // Identity with no backing profile: the session
                            // must not proceed
                            tracing::warn!(
                                uid = %identity.uid,
                                attempts = retry.max_attempts,
                                "Profile never appeared; forcing sign-out"
                            );
                            if let Err(e) = auth.sign_out().await {
                                tracing::error!(error = %e, "Forced sign-out failed");
                            }
                            let _ = state_tx.send(SessionState::SignedOut);
                        }
                        Err(e) => {
                            // Fatal store error during init degrades to
                            // signed-out, never an indefinite loading state
                            tracing::error!(uid = %identity.uid, error = %e, "Profile resolution failed");
                            let _ = state_tx.send(SessionState::SignedOut);
                        }
                    }
                }
            },

            push = next_push(&mut live), if live.is_some() => match push {
                // Sole writer of the live snapshot: replace wholesale,
                // last-write-wins, no local merging
                Some(profile) => {
                    let _ = state_tx.send(SessionState::Active(profile));
                }
                None => {
                    tracing::warn!("Live subscription ended remotely");
                    live = None;
                }
            },
        }
    }

    release(&mut live);
}

/// Close the live watch exactly once.
fn release(live: &mut Option<ProfileWatch>) {
    if let Some(watch) = live.take() {
        watch.close();
    }
}

async fn next_push(live: &mut Option<ProfileWatch>) -> Option<Profile> {
    match live {
        Some(watch) => watch.next().await,
        None => std::future::pending().await,
    }
}

/// Existence check plus bounded retry for the creation race: an identity's
/// first sign-in may race the first write of its profile document.
async fn resolve_profile(
    store: &dyn ProfileStore,
    identity: &Identity,
    retry: RetryPolicy,
) -> Result<Option<Profile>> {
    if let Some(profile) = store.get(&identity.uid).await? {
        return Ok(Some(profile));
    }

    tracing::info!(uid = %identity.uid, "Profile not found; polling for first write");
    retry
        .poll_until(|attempt| {
            let uid = identity.uid.clone();
            async move {
                tracing::debug!(uid = %uid, attempt, "Profile existence re-check");
                store.get(&uid).await
            }
        })
        .await
}
