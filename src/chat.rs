//! Chat completion backend.
//!
//! [`OpenAiChat`] sends the composed prompt as a single user message to
//! `POST {url}/chat/completions` and returns the first choice's content.
//! Like the embedding backends it never retries; failures surface as
//! [`RagError::ChatBackend`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use ragdex_core::chat::ChatModel;
use ragdex_core::{RagError, Result};

use crate::config::ChatConfig;
use crate::embedding::read_api_key;

/// Build the configured chat backend, or `None` when chat is disabled.
pub fn create_chat(config: &ChatConfig) -> Result<Option<Arc<dyn ChatModel>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Arc::new(OpenAiChat::new(config)?))),
        other => Err(RagError::Configuration(format!(
            "Unknown chat provider: {}",
            other
        ))),
    }
}

pub struct OpenAiChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let api_key = read_api_key(&config.api_key_env)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::ChatBackend(format!("chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RagError::ChatBackend(format!(
                "chat API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RagError::ChatBackend(format!("chat returned invalid JSON: {}", e)))?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`, trimmed.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|c| c.trim().to_string())
        .ok_or_else(|| {
            RagError::ChatBackend("Invalid chat response: missing choices[0].message.content".to_string())
        })
}
