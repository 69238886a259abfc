// SPDX-License-Identifier: MIT

//! Profile store collaborator: request/response reads and writes plus a
//! long-lived push channel per profile.

mod firestore;
mod memory;

pub use firestore::FirestoreProfileStore;
pub use memory::MemoryProfileStore;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{Profile, ProfileUpdate};

/// Narrow contract over the hosted document store.
///
/// `get`/`create` are one-shot request/response; `update_fields` writes are
/// independent partial updates with no multi-field transaction guarantee;
/// `subscribe` opens a push channel that delivers the full profile on every
/// remote change.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<Profile>>;

    /// Write a brand-new profile document. Called at most once per identity.
    async fn create(&self, profile: &Profile) -> Result<()>;

    async fn update_fields(&self, uid: &str, update: &ProfileUpdate) -> Result<()>;

    /// Open a live subscription for one profile document.
    async fn subscribe(&self, uid: &str) -> Result<ProfileWatch>;
}

/// Live subscription handle for one profile document.
///
/// Every push carries the full current profile; the consumer replaces its
/// snapshot wholesale. `close` is idempotent and stops delivery immediately;
/// dropping the watch closes it too.
pub struct ProfileWatch {
    rx: mpsc::Receiver<Profile>,
    cancel: CancellationToken,
}

impl ProfileWatch {
    /// Pair a receiving channel with the token the producer side observes.
    pub fn new(rx: mpsc::Receiver<Profile>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next pushed snapshot, or `None` once the watch is closed or the
    /// remote channel ends.
    pub async fn next(&mut self) -> Option<Profile> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            profile = self.rx.recv() => profile,
        }
    }

    /// Stop delivery. Safe to call repeatedly.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProfileWatch {
    fn drop(&mut self) {
        self.close();
    }
}
