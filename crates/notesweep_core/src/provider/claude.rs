//! Anthropic Messages API classification adapter.
//!
//! # Responsibility
//! - Implement the [`Classifier`] contract as one blocking, single-shot
//!   completion call per prompt.
//!
//! # Invariants
//! - No session state persists across calls.
//! - The adapter returns raw answer text; membership validation stays in
//!   the categorizer.

use crate::classify::{ClassifyError, Classifier};
use crate::config::SweepConfig;
use crate::provider::{build_http_client, ProviderInitError};
use log::debug;
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 30;

// Answers longer than one category label are invalid regardless.
const MAX_ANSWER_TOKENS: u32 = 20;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Blocking HTTP classifier over the Anthropic Messages API.
pub struct ClaudeClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ClaudeClassifier {
    pub fn from_config(config: &SweepConfig) -> Result<Self, ProviderInitError> {
        Ok(Self {
            client: build_http_client(REQUEST_TIMEOUT_SECS)?,
            endpoint: MESSAGES_URL.to_string(),
            api_key: config.anthropic_api_key.clone(),
            model: config.anthropic_model.clone(),
        })
    }

    /// Overrides the service endpoint; used by integration tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Classifier for ClaudeClassifier {
    fn classify(&self, prompt: &str) -> Result<String, ClassifyError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_ANSWER_TOKENS,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .map_err(|err| ClassifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ClassifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|err| ClassifyError::Malformed(err.to_string()))?;

        let answer = parsed
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .unwrap_or_default();
        if answer.is_empty() {
            return Err(ClassifyError::Malformed(
                "response carried no text content".to_string(),
            ));
        }

        debug!("event=classify_call module=provider status=ok model={}", self.model);
        Ok(answer)
    }
}
