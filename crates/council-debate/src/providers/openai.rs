// ABOUTME: OpenAI Responses API adapter implementing the ChatProvider trait.
// ABOUTME: Reads either the flat output_text field or nested output content arrays.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use council_core::{ChatMessage, ProviderConfig, ProviderKind, RequestSettings, Role};

use crate::provider::{ChatOutcome, ChatProvider, ProviderError, merge_overrides};

/// Adapter for the OpenAI Responses API with bearer authentication.
pub struct OpenAiProvider {
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build the JSON request body for `POST /responses`. The Responses API
    /// takes system prompts inline as a system-role input message, so roles
    /// pass through unchanged.
    pub fn build_request_body(
        model: &str,
        messages: &[ChatMessage],
        settings: &RequestSettings,
        provider_cfg: &ProviderConfig,
    ) -> Value {
        let input: Vec<Value> = messages
            .iter()
            .map(|message| {
                let role = match message.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({
                    "role": role,
                    "content": [{"type": "text", "text": message.content}],
                })
            })
            .collect();

        let mut payload = json!({
            "model": model,
            "input": input,
        });

        if let Some(max_tokens) = settings.max_output_tokens {
            payload["max_output_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = settings.temperature {
            payload["temperature"] = json!(temperature);
        }
        if let Some(reasoning) = &provider_cfg.reasoning {
            payload["reasoning"] = reasoning.clone();
        }

        merge_overrides(&mut payload, &provider_cfg.request_overrides);
        payload
    }

    /// Prefer the flat `output_text` field; otherwise concatenate every text
    /// fragment in the nested `output[].content[]` arrays. A body with
    /// neither shape has no extractable text.
    pub fn extract_text(body: &Value) -> Result<String, ProviderError> {
        if let Some(text) = body.get("output_text").and_then(|t| t.as_str()) {
            return Ok(text.to_string());
        }

        let output = body
            .get("output")
            .and_then(|o| o.as_array())
            .ok_or_else(|| ProviderError::NoText {
                provider: ProviderKind::OpenAi,
                detail: "neither output_text nor output array present".to_string(),
            })?;

        let mut text = String::new();
        for item in output {
            if let Some(content) = item.get("content").and_then(|c| c.as_array()) {
                for fragment in content {
                    if let Some(piece) = fragment.get("text").and_then(|t| t.as_str()) {
                        text.push_str(piece);
                    }
                }
            }
        }
        Ok(text)
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn list_models(
        &self,
        api_key: &str,
        base_url: &str,
        timeout_s: u64,
    ) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(timeout_s))
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::OpenAi,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::OpenAi,
                operation: "list models",
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::OpenAi,
                source,
            })?;

        let mut models: Vec<String> = data
            .get("data")
            .and_then(|d| d.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(|id| id.as_str()))
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        Ok(models)
    }

    async fn chat(
        &self,
        api_key: &str,
        base_url: &str,
        model: &str,
        messages: &[ChatMessage],
        settings: &RequestSettings,
        provider_cfg: &ProviderConfig,
    ) -> Result<ChatOutcome, ProviderError> {
        let body = Self::build_request_body(model, messages, settings, provider_cfg);
        let url = format!("{}/responses", base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(settings.timeout_s))
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::OpenAi,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::OpenAi,
                operation: "chat",
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::OpenAi,
                source,
            })?;

        let text = Self::extract_text(&raw)?;
        Ok(ChatOutcome { text, raw })
    }
}
