// ABOUTME: Google Gemini generateContent adapter implementing the ChatProvider trait.
// ABOUTME: Remaps assistant to the `model` role and reads text from candidate parts.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use council_core::{ChatMessage, ProviderConfig, ProviderKind, RequestSettings, Role};

use crate::provider::{ChatOutcome, ChatProvider, ProviderError, merge_overrides};

/// Adapter for the Gemini generateContent API. Authentication is a `key`
/// query parameter rather than a header.
pub struct GeminiProvider {
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build the JSON request body for `models/{model}:generateContent`.
    /// System messages become `systemInstruction`; assistant turns use the
    /// `model` role. Generation settings are only included when configured.
    pub fn build_request_body(
        messages: &[ChatMessage],
        settings: &RequestSettings,
        provider_cfg: &ProviderConfig,
    ) -> Value {
        let mut system_text = String::new();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_text = message.content.clone(),
                Role::User | Role::Assistant => {
                    let role = match message.role {
                        Role::Assistant => "model",
                        _ => "user",
                    };
                    contents.push(json!({
                        "role": role,
                        "parts": [{"text": message.content}],
                    }));
                }
            }
        }

        let mut payload = json!({"contents": contents});

        if !system_text.is_empty() {
            payload["systemInstruction"] = json!({"parts": [{"text": system_text}]});
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = settings.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = settings.max_output_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if let Some(extra) = provider_cfg.generation_config.as_ref().and_then(|v| v.as_object()) {
            for (key, value) in extra {
                generation_config.insert(key.clone(), value.clone());
            }
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        merge_overrides(&mut payload, &provider_cfg.request_overrides);
        payload
    }

    /// Concatenate the text parts of the first candidate. An empty candidate
    /// list means the backend produced nothing extractable.
    pub fn extract_text(body: &Value) -> Result<String, ProviderError> {
        let candidates = body
            .get("candidates")
            .and_then(|c| c.as_array())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::NoText {
                provider: ProviderKind::Gemini,
                detail: "no candidates in response".to_string(),
            })?;

        let parts = candidates[0]
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array());

        let mut text = String::new();
        if let Some(parts) = parts {
            for part in parts {
                if let Some(fragment) = part.get("text").and_then(|t| t.as_str()) {
                    text.push_str(fragment);
                }
            }
        }
        Ok(text)
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn list_models(
        &self,
        api_key: &str,
        base_url: &str,
        timeout_s: u64,
    ) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models?key={}", base_url.trim_end_matches('/'), api_key);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(timeout_s))
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::Gemini,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::Gemini,
                operation: "list models",
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::Gemini,
                source,
            })?;

        let mut models: Vec<String> = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("name").and_then(|n| n.as_str()))
                    .map(|name| name.strip_prefix("models/").unwrap_or(name).to_string())
                    .filter(|name| !name.is_empty())
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
        let body = Self::build_request_body(messages, settings, provider_cfg);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            base_url.trim_end_matches('/'),
            model,
            api_key
        );

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(settings.timeout_s))
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: ProviderKind::Gemini,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::Gemini,
                operation: "chat",
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|source| ProviderError::InvalidBody {
                provider: ProviderKind::Gemini,
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
            temperature: Some(0.4),
            max_output_tokens: Some(2048),
        }
    }

    #[test]
    fn assistant_role_becomes_model() {
        let messages = vec![
            ChatMessage::system("Be direct."),
            ChatMessage::user("First question"),
            ChatMessage::assistant("First answer"),
            ChatMessage::user("Follow-up"),
        ];
        let body =
            GeminiProvider::build_request_body(&messages, &settings(), &ProviderConfig::default());

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be direct.");
    }

    #[test]
    fn generation_config_only_includes_configured_fields() {
        let messages = vec![ChatMessage::user("hi")];
        let sparse = RequestSettings {
            timeout_s: 60,
            temperature: None,
            max_output_tokens: Some(256),
        };
        let body =
            GeminiProvider::build_request_body(&messages, &sparse, &ProviderConfig::default());

        let config = body["generationConfig"].as_object().unwrap();
        assert!(!config.contains_key("temperature"));
        assert_eq!(config["maxOutputTokens"], 256);
    }

    #[test]
    fn empty_settings_omit_generation_config() {
        let messages = vec![ChatMessage::user("hi")];
        let empty = RequestSettings {
            timeout_s: 60,
            temperature: None,
            max_output_tokens: None,
        };
        let body = GeminiProvider::build_request_body(&messages, &empty, &ProviderConfig::default());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn provider_generation_config_merges_in() {
        let cfg = ProviderConfig {
            generation_config: Some(json!({"topP": 0.9, "temperature": 1.0})),
            ..ProviderConfig::default()
        };

        let messages = vec![ChatMessage::user("hi")];
        let body = GeminiProvider::build_request_body(&messages, &settings(), &cfg);

        let config = body["generationConfig"].as_object().unwrap();
        // Provider-level config wins over the shared setting.
        assert_eq!(config["temperature"], 1.0);
        assert_eq!(config["topP"], 0.9);
        assert_eq!(config["maxOutputTokens"], 2048);
    }

    #[test]
    fn extract_text_joins_first_candidate_parts() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "Alpha"}, {"text": " beta"}]}},
                {"content": {"parts": [{"text": "ignored"}]}},
            ]
        });
        assert_eq!(GeminiProvider::extract_text(&body).unwrap(), "Alpha beta");
    }

    #[test]
    fn empty_candidates_is_no_text_error() {
        let body = json!({"candidates": []});
        let err = GeminiProvider::extract_text(&body).unwrap_err();
        assert!(matches!(err, ProviderError::NoText { .. }));
    }
}
