// ABOUTME: Defines the ChatProvider trait that all backend adapters implement.
// ABOUTME: Also defines ChatOutcome (normalized response) and ProviderError (per-call failures).

use async_trait::async_trait;
use serde_json::Value;

use council_core::{ChatMessage, ProviderConfig, ProviderKind, RequestSettings};

/// Errors raised by a single provider call. These never abort a debate;
/// the engine converts them into error replies.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure, including timeouts and connection errors.
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        source: reqwest::Error,
    },

    /// Non-success HTTP status; the raw body is kept for diagnostics.
    #[error("{provider} {operation} failed: {status} {body}")]
    Status {
        provider: ProviderKind,
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not parse as JSON.
    #[error("{provider} returned an unparseable body: {source}")]
    InvalidBody {
        provider: ProviderKind,
        source: reqwest::Error,
    },

    /// A success status whose envelope contained no extractable text. This
    /// is distinct from a model legitimately answering with an empty string.
    #[error("{provider} response contained no text: {detail}")]
    NoText {
        provider: ProviderKind,
        detail: String,
    },
}

/// A normalized chat response: the concatenated text plus the raw envelope
/// for diagnostics.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub text: String,
    pub raw: Value,
}

/// Trait that all backend adapters implement. Each adapter translates the
/// internal message model into one wire format and maps the response back
/// to text. Credentials and URLs are passed per call; adapters hold no
/// state beyond an HTTP client.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which backend this adapter speaks to.
    fn kind(&self) -> ProviderKind;

    /// List the model ids the backend offers, sorted ascending.
    async fn list_models(
        &self,
        api_key: &str,
        base_url: &str,
        timeout_s: u64,
    ) -> Result<Vec<String>, ProviderError>;

    /// Send one chat request and return the normalized response.
    async fn chat(
        &self,
        api_key: &str,
        base_url: &str,
        model: &str,
        messages: &[ChatMessage],
        settings: &RequestSettings,
        provider_cfg: &ProviderConfig,
    ) -> Result<ChatOutcome, ProviderError>;
}

/// Shallow-merge operator-supplied overrides onto a computed payload.
/// Top-level keys win wholesale; adapters never inspect their schema.
pub(crate) fn merge_overrides(payload: &mut Value, overrides: &serde_json::Map<String, Value>) {
    if let Some(object) = payload.as_object_mut() {
        for (key, value) in overrides {
            object.insert(key.clone(), value.clone());
        }
    }
}
