// SPDX-License-Identifier: MIT

//! Sultan-Session smoke tool
//!
//! Signs in with credentials from the environment, follows the session
//! through profile resolution, prints the live profile, and signs out.
//! Useful for verifying project wiring against a real or emulated backend.

use std::sync::Arc;

use sultan_session::{
    AuthProvider, Config, FirebaseAuth, FirestoreProfileStore, SessionEngine, SessionState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(project = %config.gcp_project_id, "Starting Sultan-Session smoke tool");

    let store = Arc::new(
        FirestoreProfileStore::new(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
    );

    let auth = Arc::new(FirebaseAuth::new(&config, store.clone()));

    let handle = SessionEngine::from_config(&config, auth.clone(), store).start();
    let mut state = handle.state();

    let email = std::env::var("PORTAL_EMAIL").expect("PORTAL_EMAIL not set");
    let password = std::env::var("PORTAL_PASSWORD").expect("PORTAL_PASSWORD not set");
    auth.sign_in_with_password(&email, &password).await?;

    // Follow the session until it settles
    loop {
        state.changed().await?;
        let snapshot = state.borrow_and_update().clone();
        match snapshot {
            SessionState::Loading(identity) => {
                tracing::info!(uid = %identity.uid, "Resolving profile");
            }
            SessionState::Active(profile) => {
                println!(
                    "{} — level {} ({} xp), {} points",
                    profile.name, profile.level, profile.xp, profile.points
                );
                break;
            }
            SessionState::SignedOut => {
                tracing::error!("Session ended before going live");
                break;
            }
            SessionState::Initializing => {}
        }
    }

    auth.sign_out().await?;
    handle.shutdown();
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sultan_session=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
