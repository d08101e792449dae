// ABOUTME: Anthropic Messages API adapter implementing the ChatProvider trait.
// ABOUTME: Splits system messages into the dedicated `system` field and joins text content blocks.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use council_core::{ChatMessage, ProviderConfig, ProviderKind, RequestSettings, Role};

use crate::provider::{ChatOutcome, ChatProvider, ProviderError, merge_overrides};

const API_VERSION: &str = "2023-06-01";

// The Messages API rejects requests without max_tokens, so a floor is
// applied even when the caller configured none.
const FALLBACK_MAX_TOKENS: u32 = 1024;

/// Adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build the JSON request body for `POST /messages`. System messages are
    /// pulled out into the `system` field; the rest become content-block
    /// messages. Operator overrides are merged last.
    pub fn build_request_body(
        model: &str,
        messages: &[ChatMessage],
        settings: &RequestSettings,
        provider_cfg: &ProviderConfig,
    ) -> Value {
        let mut system_text = String::new();
        let mut payload_messages = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_text = message.content.clone(),
                Role::User | Role::Assistant => {
                    let role = match message.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    };
                    payload_messages.push(json!({
                        "role": role,
                        "content": [{"type": "text", "text": message.content}],
                    }));
                }
            }
        }

        let mut payload = json!({
            "model": model,
            "max_tokens": settings.max_output_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            "messages": payload_messages,
        });

        if let Some(temperature) = settings.temperature {
            payload["temperature"] = json!(temperature);
        }
        if !system_text.is_empty() {
            payload["system"] = json!(system_text);
        }
        if let Some(thinking) = &provider_cfg.thinking {
            payload["thinking"] = thinking.clone();
        }

        merge_overrides(&mut payload, &provider_cfg.request_overrides);
        payload
    }

    /// Concatenate every `text` content block in order. A body without a
    /// content array has no extractable text and is an explicit failure.
    pub fn extract_text(body: &Value) -> Result<String, ProviderError> {
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| ProviderError::NoText {
                provider: ProviderKind::Anthropic,
                detail: "missing content array".to_string(),
            })?;

        let mut text = String::new();
        for block in blocks {
            if block.get("type").and_then(|t| t.as_str()) == Some("text")
                && let Some(fragment) = block.get("text").and_then(|t| t.as_str())
            {
                text.push_str(fragment);
            }
        }
        Ok(text)
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
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
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(Duration::from_secs(timeout_s))
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::Anthropic,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::Anthropic,
                operation: "list models",
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::Anthropic,
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
        let url = format!("{}/messages", base_url.trim_end_matches('/'));
        let version = provider_cfg.version.as_deref().unwrap_or(API_VERSION);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", version)
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(settings.timeout_s))
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::Anthropic,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::Anthropic,
                operation: "chat",
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::Anthropic,
                source,
            })?;

        let text = Self::extract_text(&raw)?;
        Ok(ChatOutcome { text, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RequestSettings {
        RequestSettings {
            timeout_s: 60,
            temperature: Some(0.2),
            max_output_tokens: Some(512),
        }
    }

    #[test]
    fn system_message_moves_to_dedicated_field() {
        let messages = vec![
            ChatMessage::system("Be direct."),
            ChatMessage::user("What is Rust?"),
        ];
        let body = AnthropicProvider::build_request_body(
            "claude-sonnet-4-5",
            &messages,
            &settings(),
            &ProviderConfig::default(),
        );

        assert_eq!(body["system"], "Be direct.");
        let payload_messages = body["messages"].as_array().unwrap();
        assert_eq!(payload_messages.len(), 1);
        assert_eq!(payload_messages[0]["role"], "user");
        assert_eq!(payload_messages[0]["content"][0]["text"], "What is Rust?");
    }

    #[test]
    fn max_tokens_falls_back_when_unset() {
        let messages = vec![ChatMessage::user("hi")];
        let settings = RequestSettings {
            timeout_s: 60,
            temperature: None,
            max_output_tokens: None,
        };
        let body = AnthropicProvider::build_request_body(
            "claude-sonnet-4-5",
            &messages,
            &settings,
            &ProviderConfig::default(),
        );

        assert_eq!(body["max_tokens"], FALLBACK_MAX_TOKENS);
        assert!(body.get("temperature").is_none());
        assert!(body.get("system").is_none());
    }

    #[test]
    fn thinking_and_overrides_pass_through() {
        let mut cfg = ProviderConfig {
            thinking: Some(json!({"type": "enabled", "budget_tokens": 1024})),
            ..ProviderConfig::default()
        };
        cfg.request_overrides.insert("top_k".to_string(), json!(40));

        let messages = vec![ChatMessage::user("hi")];
        let body =
            AnthropicProvider::build_request_body("claude-sonnet-4-5", &messages, &settings(), &cfg);

        assert_eq!(body["thinking"]["budget_tokens"], 1024);
        assert_eq!(body["top_k"], 40);
    }

    #[test]
    fn extract_text_joins_blocks_in_order() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": ", world"},
            ]
        });
        assert_eq!(AnthropicProvider::extract_text(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn missing_content_array_is_no_text_error() {
        let body = json!({"id": "msg_1", "type": "message"});
        let err = AnthropicProvider::extract_text(&body).unwrap_err();
        assert!(matches!(err, ProviderError::NoText { .. }));
    }
}
