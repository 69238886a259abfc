// SPDX-License-Identifier: MIT

//! In-memory profile store for tests and local development.
//!
//! Mirrors the hosted store's observable behavior: subscriptions receive the
//! current document on attach and the full document on every write. Two
//! knobs exist for exercising failure paths without an emulator: injected
//! read/write failures and a push hold that delays subscription delivery so
//! the gap between "write accepted" and "snapshot updated" is observable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SessionError};
use crate::models::{Profile, ProfileUpdate};
use crate::store::{ProfileStore, ProfileWatch};

const WATCH_BUFFER: usize = 16;

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: DashMap<String, Profile>,
    watchers: DashMap<String, Vec<mpsc::Sender<Profile>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    hold_pushes: AtomicBool,
    held: Mutex<Vec<Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `get` calls fail, as if the store were unreachable.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail, as if rejected by the store.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Buffer subscription pushes instead of delivering them. Writes still
    /// apply; delivery resumes with `release_pushes`.
    pub fn hold_pushes(&self) {
        self.hold_pushes.store(true, Ordering::SeqCst);
    }

    /// Deliver everything buffered while pushes were held.
    pub async fn release_pushes(&self) {
        self.hold_pushes.store(false, Ordering::SeqCst);
        let held: Vec<Profile> = std::mem::take(&mut *self.held.lock().expect("held lock"));
        for profile in held {
            self.push(profile).await;
        }
    }

    async fn push(&self, profile: Profile) {
        if self.hold_pushes.load(Ordering::SeqCst) {
            self.held.lock().expect("held lock").push(profile);
            return;
        }
        // Clone the sender list out so no map guard is held across await
        let senders = self.watchers.get(&profile.uid).map(|s| s.clone());
        if let Some(senders) = senders {
            for tx in &senders {
                let _ = tx.send(profile.clone()).await;
            }
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::Store("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<Profile>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SessionError::Store("injected read failure".to_string()));
        }
        Ok(self.profiles.get(uid).map(|p| p.clone()))
    }

    async fn create(&self, profile: &Profile) -> Result<()> {
        self.check_write()?;
        self.profiles.insert(profile.uid.clone(), profile.clone());
        self.push(profile.clone()).await;
        Ok(())
    }

    async fn update_fields(&self, uid: &str, update: &ProfileUpdate) -> Result<()> {
        self.check_write()?;
        let updated = {
            let mut entry = self
                .profiles
                .get_mut(uid)
                .ok_or_else(|| SessionError::Store(format!("no document for uid {}", uid)))?;
            update.apply_to(&mut entry);
            entry.clone()
        };
        self.push(updated).await;
        Ok(())
    }

    async fn subscribe(&self, uid: &str) -> Result<ProfileWatch> {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);

        // Initial snapshot, like the hosted listener's first delivery
        if let Some(profile) = self.profiles.get(uid) {
            let _ = tx.send(profile.clone()).await;
        }

        self.watchers.entry(uid.to_string()).or_default().push(tx);
        Ok(ProfileWatch::new(rx, CancellationToken::new()))
    }
}
