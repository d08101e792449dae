// ABOUTME: Test doubles for the debate engine: a scriptable stub provider.
// ABOUTME: Records every chat invocation so tests can assert prompts and call counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use council_core::{ChatMessage, ProviderConfig, ProviderKind, RequestSettings};

use crate::provider::{ChatOutcome, ChatProvider, ProviderError};

/// What a stub does when its `chat` method is invoked.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Succeed with the given text.
    Reply(String),
    /// Fail with an HTTP-status provider error.
    FailStatus { status: u16, body: String },
}

/// One recorded `chat` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// A scriptable ChatProvider for tests. Never touches the network; every
/// call is recorded for later inspection.
pub struct StubProvider {
    kind: ProviderKind,
    behavior: StubBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubProvider {
    pub fn replying(kind: ProviderKind, text: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: StubBehavior::Reply(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ProviderKind, status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior: StubBehavior::FailStatus {
                status,
                body: body.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// Build a provider registry from stubs, keyed by each stub's kind.
pub fn registry(
    stubs: impl IntoIterator<Item = Arc<StubProvider>>,
) -> HashMap<ProviderKind, Arc<dyn ChatProvider>> {
    stubs
        .into_iter()
        .map(|stub| (stub.kind, stub as Arc<dyn ChatProvider>))
        .collect()
}

#[async_trait]
impl ChatProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn list_models(
        &self,
        _api_key: &str,
        _base_url: &str,
        _timeout_s: u64,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["stub-model-a".to_string(), "stub-model-b".to_string()])
    }

    async fn chat(
        &self,
        _api_key: &str,
        _base_url: &str,
        model: &str,
        messages: &[ChatMessage],
        _settings: &RequestSettings,
        _provider_cfg: &ProviderConfig,
    ) -> Result<ChatOutcome, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            messages: messages.to_vec(),
        });

        match &self.behavior {
            StubBehavior::Reply(text) => Ok(ChatOutcome {
                text: text.clone(),
                raw: serde_json::json!({"stub": true}),
            }),
            StubBehavior::FailStatus { status, body } => Err(ProviderError::Status {
                provider: self.kind,
                operation: "chat",
                status: *status,
                body: body.clone(),
            }),
        }
    }
}
