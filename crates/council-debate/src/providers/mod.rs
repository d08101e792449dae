// ABOUTME: Backend adapter module aggregating one ChatProvider implementation per wire protocol.
// ABOUTME: New backends add a sub-module and a registry entry; the engine never changes.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;

use council_core::ProviderKind;

use crate::provider::ChatProvider;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Build the default adapter registry, one entry per supported backend.
pub fn default_providers() -> HashMap<ProviderKind, Arc<dyn ChatProvider>> {
    let mut providers: HashMap<ProviderKind, Arc<dyn ChatProvider>> = HashMap::new();
    providers.insert(ProviderKind::Gemini, Arc::new(GeminiProvider::new()));
    providers.insert(ProviderKind::Anthropic, Arc::new(AnthropicProvider::new()));
    providers.insert(ProviderKind::OpenAi, Arc::new(OpenAiProvider::new()));
    providers
}
