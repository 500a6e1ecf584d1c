use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use wayfinder_core::{ConciergeError, Intent, LlmConfig, QueryAnalysis};

use crate::{Extraction, QueryExtractor};

pub const EXTRACTION_PROMPT: &str = "You extract travel queries. Reply with exactly two lines and nothing else.\n\
Location: <the city or place the user wants to visit, or None>\n\
Intent: <Weather if they only ask about weather, Places if they only ask what to see or do, Both otherwise>";

const NO_LOCATION_VALUES: [&str; 5] = ["", "none", "null", "n/a", "unknown"];

/// Reads the two-line `Location:` / `Intent:` protocol.
///
/// Labels and values are case-insensitive, bullets and bold markers are
/// ignored, and the first occurrence of each label wins. A missing or
/// unrecognised intent reads as [`Intent::Both`].
pub fn parse_llm_reply(text: &str) -> QueryAnalysis {
    let mut location: Option<Option<String>> = None;
    let mut intent: Option<Intent> = None;

    for line in text.lines() {
        let line = line.replace("**", "");
        let line = line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '•'));
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = clean_value(value);

        match label.trim().to_lowercase().as_str() {
            "location" if location.is_none() => {
                let missing = NO_LOCATION_VALUES.contains(&value.to_lowercase().as_str());
                location = Some((!missing).then(|| value.to_string()));
            }
            "intent" if intent.is_none() => {
                intent = Some(Intent::parse(value).unwrap_or(Intent::Both));
            }
            _ => {}
        }
    }

    QueryAnalysis {
        location: location.flatten(),
        intent: intent.unwrap_or(Intent::Both),
    }
}

fn clean_value(value: &str) -> &str {
    value
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim()
}

/// Text of a Responses API payload: `output_text` when present, otherwise
/// every `output_text` content chunk joined by blank lines.
pub fn extract_output_text(payload: &Value) -> Option<String> {
    if let Some(value) = payload.get("output_text").and_then(Value::as_str) {
        return Some(value.to_string());
    }

    let chunks = payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|content| content.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .map(str::to_string)
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n\n"))
    }
}

pub struct LlmExtractor {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl LlmExtractor {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(6).min(timeout))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(&self, api_key: &str, text: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "input": [
                {
                    "role": "system",
                    "content": [
                        { "type": "input_text", "text": EXTRACTION_PROMPT }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": text }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .context("language-model request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("language-model non-success status {}: {}", status.as_u16(), body);
        }

        let body: Value = response
            .json()
            .await
            .context("language-model parse failed")?;
        extract_output_text(&body)
            .filter(|value| !value.trim().is_empty())
            .context("language-model output text missing")
    }
}

#[async_trait]
impl QueryExtractor for LlmExtractor {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(&self, text: &str) -> Result<Extraction, ConciergeError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ConciergeError::configuration("language-model extractor"));
        };

        match self.complete(api_key, text).await {
            Ok(reply) => {
                debug!(reply = %reply, "language-model extraction");
                let analysis = parse_llm_reply(&reply);
                Ok(Extraction {
                    strategy: analysis.location.is_some().then_some("llm"),
                    analysis,
                })
            }
            Err(err) => {
                warn!(error = %err, "language-model extraction failed");
                Ok(Extraction::empty())
            }
        }
    }
}
