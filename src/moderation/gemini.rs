// SPDX-License-Identifier: MIT

//! Gemini-backed moderation client.
//!
//! Each classification is one `generateContent` call constrained to a JSON
//! response schema. Transport failures, non-success statuses, and
//! undecodable responses all yield the safe default.

use serde::Deserialize;

use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::moderation::{Moderation, TextVerdict, UrlVerdict};

const MODEL: &str = "gemini-3-flash-preview";

/// Gemini moderation client.
#[derive(Clone)]
pub struct GeminiModeration {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiModeration {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.gemini_base_url.clone(),
            api_key: config.gemini_api_key.clone(),
        }
    }

    /// One schema-constrained generateContent call.
    async fn request_verdict<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<T> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, MODEL, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Moderation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Moderation(format!("HTTP {}: {}", status, body)));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Moderation(format!("JSON parse error: {}", e)))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| SessionError::Moderation("empty candidate list".to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| SessionError::Moderation(format!("verdict parse error: {}", e)))
    }
}

#[async_trait::async_trait]
impl Moderation for GeminiModeration {
    async fn classify_text(&self, text: &str) -> TextVerdict {
        let prompt = format!(
            "Analyze this Arabic/English text for profanity, insults, or harmful content. \
             Respond in JSON. Text: \"{}\"",
            text
        );
        let schema = serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "isSafe": { "type": "BOOLEAN" },
                "reason": { "type": "STRING" },
            },
            "required": ["isSafe"],
        });

        match self.request_verdict(prompt, schema).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "Text moderation failed; assuming safe");
                TextVerdict::assume_safe()
            }
        }
    }

    async fn classify_url(&self, url: &str) -> UrlVerdict {
        let prompt = format!(
            "Analyze if this URL looks like a phishing or malicious link. URL: {}. \
             Respond in JSON.",
            url
        );
        let schema = serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "isSafe": { "type": "BOOLEAN" },
                "rating": { "type": "STRING", "description": "Safe, Risky, or Dangerous" },
            },
            "required": ["isSafe", "rating"],
        });

        match self.request_verdict(prompt, schema).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "URL moderation failed; assuming safe");
                UrlVerdict::assume_safe()
            }
        }
    }
}

/// generateContent response envelope, reduced to what we read.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}
