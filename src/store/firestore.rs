// SPDX-License-Identifier: MIT

//! Firestore-backed profile store.
//!
//! Profiles live in the `users` collection, keyed by the auth uid. Partial
//! writes go through the fluent update API with explicit field paths; the
//! live subscription uses the Firestore listen channel.

use firestore::{
    FirestoreDb, FirestoreListenEvent, FirestoreListenerTarget,
    FirestoreTempFilesListenStateStorage,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SessionError};
use crate::models::{Profile, ProfileUpdate};
use crate::store::{ProfileStore, ProfileWatch};

const USERS: &str = "users";

/// Listener target id for single-profile subscriptions.
const PROFILE_TARGET_ID: u32 = 17;

/// Buffered pushes per subscription before backpressure.
const WATCH_BUFFER: usize = 8;

/// Firestore profile store client.
#[derive(Clone)]
pub struct FirestoreProfileStore {
    client: Option<FirestoreDb>,
}

impl FirestoreProfileStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = FirestoreDb::new(project_id).await.map_err(|e| {
            SessionError::Store(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            SessionError::Store(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock store for testing (offline mode).
    ///
    /// All operations return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&FirestoreDb> {
        self.client.as_ref().ok_or_else(|| {
            SessionError::Store("Database not connected (offline mode)".to_string())
        })
    }
}

#[async_trait::async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<Profile>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| SessionError::Store(e.to_string()))
    }

    async fn create(&self, profile: &Profile) -> Result<()> {
        let _: Profile = self
            .get_client()?
            .fluent()
            .insert()
            .into(USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| SessionError::Store(e.to_string()))?;
        Ok(())
    }

    async fn update_fields(&self, uid: &str, update: &ProfileUpdate) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(update.field_paths())
            .in_col(USERS)
            .document_id(uid)
            .object(update)
            .execute()
            .await
            .map_err(|e| SessionError::Store(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, uid: &str) -> Result<ProfileWatch> {
        let client = self.get_client()?.clone();
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let cancel = CancellationToken::new();

        let mut listener = client
            .create_listener(FirestoreTempFilesListenStateStorage::new())
            .await
            .map_err(|e| SessionError::Store(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .by_id_in(USERS)
            .batch_listen([uid.to_string()])
            .add_target(FirestoreListenerTarget::new(PROFILE_TARGET_ID), &mut listener)
            .map_err(|e| SessionError::Store(format!("Failed to add listen target: {}", e)))?;

        let push_uid = uid.to_string();
        listener
            .start(move |event| {
                let tx = tx.clone();
                let uid = push_uid.clone();
                async move {
                    if let FirestoreListenEvent::DocumentChange(change) = event {
                        if let Some(doc) = change.document {
                            match FirestoreDb::deserialize_doc_to::<Profile>(&doc) {
                                Ok(profile) => {
                                    // Full snapshot per change; consumer replaces wholesale
                                    let _ = tx.send(profile).await;
                                }
                                Err(e) => {
                                    tracing::warn!(uid = %uid, error = %e, "Undecodable profile push")
                                }
                            }
                        }
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| SessionError::Store(format!("Failed to start listener: {}", e)))?;

        // Shut the remote listener down exactly once, when the watch closes.
        let stop = cancel.clone();
        tokio::spawn(async move {
            stop.cancelled().await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Listener shutdown failed");
            }
        });

        Ok(ProfileWatch::new(rx, cancel))
    }
}
