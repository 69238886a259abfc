// SPDX-License-Identifier: MIT

//! Content-moderation collaborator used by the chat surface.
//!
//! The contract is deliberately infallible: when a classification cannot be
//! completed, content is treated as safe. Availability wins over strict
//! filtering; changing that is a product decision, not a bug fix.

mod gemini;

pub use gemini::GeminiModeration;

use async_trait::async_trait;
use serde::Deserialize;

/// Verdict for a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct TextVerdict {
    #[serde(rename = "isSafe")]
    pub is_safe: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TextVerdict {
    /// The fail-open default.
    pub fn assume_safe() -> Self {
        Self {
            is_safe: true,
            reason: None,
        }
    }
}

/// Verdict for a shared URL.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlVerdict {
    #[serde(rename = "isSafe")]
    pub is_safe: bool,
    #[serde(default = "UrlVerdict::default_rating")]
    pub rating: String,
}

impl UrlVerdict {
    fn default_rating() -> String {
        "Unknown".to_string()
    }

    /// The fail-open default, marked so the UI can tell it was not rated.
    pub fn assume_safe() -> Self {
        Self {
            is_safe: true,
            rating: "Safe (Local)".to_string(),
        }
    }
}

/// Moderation collaborator contract. Both calls fail open.
#[async_trait]
pub trait Moderation: Send + Sync {
    async fn classify_text(&self, text: &str) -> TextVerdict;
    async fn classify_url(&self, url: &str) -> UrlVerdict;
}
