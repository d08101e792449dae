// ABOUTME: The three-phase debate engine: independent answers, cross-critique, moderation.
// ABOUTME: Contains per-member failures as error replies; only config errors abort a run.

use std::collections::HashMap;
use std::sync::Arc;

use council_core::{
    ChatMessage, ConfigError, CouncilConfig, DebateResult, Member, ProviderKind, Reply,
    resolve_api_key, resolve_members, resolve_moderator,
};

use crate::provider::ChatProvider;
use crate::providers::default_providers;

/// System prompt for round 1: independent answers.
pub const ROUND1_SYSTEM: &str = "You are a council member. Provide a direct, opinionated answer. \
    Be concise, practical, and avoid hedging unless needed.";

/// System prompt for round 2: cross-critique and improved stances.
pub const ROUND2_SYSTEM: &str = "You are a council member in a debate. Critique other responses, \
    identify weaknesses, and provide your improved stance. Avoid repeating your round 1 answer.";

/// System prompt for the moderation phase: final synthesis.
pub const MODERATOR_SYSTEM: &str = "You are the council moderator. Synthesize a final answer that \
    resolves disagreements, highlights tradeoffs, and ends with clear recommendations.";

/// Drives a debate through its phases, dispatching each member's call to the
/// matching adapter. Calls run sequentially in configured-member order, one
/// phase at a time, because each phase's prompts depend on the previous
/// phase's replies.
pub struct DebateEngine {
    providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
}

impl DebateEngine {
    /// Engine wired to the real backend adapters.
    pub fn new() -> Self {
        Self {
            providers: default_providers(),
        }
    }

    /// Engine with a caller-supplied adapter registry. Tests use this to
    /// substitute stubs.
    pub fn with_providers(providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>) -> Self {
        Self { providers }
    }

    /// Run a full debate for the given prompt. Always returns a complete
    /// DebateResult when the configuration is valid: failed members appear
    /// as error replies in their configured slots, never omitted.
    pub async fn run(
        &self,
        prompt: &str,
        config: &CouncilConfig,
    ) -> Result<DebateResult, ConfigError> {
        let members = resolve_members(config)?;

        let mut round1 = Vec::with_capacity(members.len());
        for member in &members {
            tracing::info!(phase = "round 1", member = %member.label(), "dispatching call");
            round1.push(self.call_member(member, prompt, ROUND1_SYSTEM, config).await);
        }

        let mut round2 = Vec::with_capacity(members.len());
        for member in &members {
            let user_prompt = rebuttal_prompt(prompt, &round1, member);
            tracing::info!(phase = "round 2", member = %member.label(), "dispatching call");
            round2.push(
                self.call_member(member, &user_prompt, ROUND2_SYSTEM, config)
                    .await,
            );
        }

        let moderator = match resolve_moderator(config, &members) {
            Some(member) => {
                let user_prompt = moderator_prompt(prompt, &round1, &round2);
                tracing::info!(phase = "moderation", member = %member.label(), "dispatching call");
                Some(
                    self.call_member(&member, &user_prompt, MODERATOR_SYSTEM, config)
                        .await,
                )
            }
            None => None,
        };

        Ok(DebateResult {
            prompt: prompt.to_string(),
            round1,
            round2,
            moderator,
        })
    }

    /// Call one member: resolve its credential and model, then dispatch to
    /// the adapter. Missing credential or model short-circuits into an error
    /// reply before any network call; adapter errors are contained the same
    /// way.
    async fn call_member(
        &self,
        member: &Member,
        user_prompt: &str,
        system_prompt: &str,
        config: &CouncilConfig,
    ) -> Reply {
        let provider_cfg = config.providers.get(member.provider);

        let Some(api_key) = resolve_api_key(provider_cfg) else {
            return Reply::failed(
                member.clone(),
                format!("Missing API key for {}.", member.provider),
            );
        };

        let model = if member.model.is_empty() {
            provider_cfg.model.clone()
        } else {
            member.model.clone()
        };
        if model.is_empty() {
            return Reply::failed(
                member.clone(),
                format!("Missing model for {}.", member.provider),
            );
        }

        let Some(adapter) = self.providers.get(&member.provider) else {
            return Reply::failed(
                member.clone(),
                format!("No adapter registered for {}.", member.provider),
            );
        };

        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];

        match adapter
            .chat(
                &api_key,
                &provider_cfg.base_url,
                &model,
                &messages,
                &config.request,
                provider_cfg,
            )
            .await
        {
            Ok(outcome) => Reply::ok(member.clone(), outcome.text),
            Err(err) => {
                tracing::warn!(member = %member.label(), error = %err, "provider call failed");
                Reply::failed(member.clone(), err.to_string())
            }
        }
    }
}

impl Default for DebateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the round-2 user prompt for one member: the original question plus
/// every other member's round-1 entry. Self is excluded by provider
/// identity; errored peers still appear with their label and empty text.
pub fn rebuttal_prompt(prompt: &str, round1: &[Reply], member: &Member) -> String {
    let mut lines = vec![
        format!("User question:\n{}", prompt),
        String::new(),
        "Other council responses:".to_string(),
    ];
    for reply in round1 {
        if reply.member.provider != member.provider {
            lines.push(format!("- {}: {}", reply.member.label(), reply.text));
        }
    }
    lines.push(String::new());
    lines.push("Provide your rebuttal and improved answer.".to_string());
    lines.join("\n")
}

/// Build the moderation user prompt: the original question plus every
/// round-1 and round-2 entry in configured order.
pub fn moderator_prompt(prompt: &str, round1: &[Reply], round2: &[Reply]) -> String {
    let mut lines = vec![
        format!("User question:\n{}", prompt),
        String::new(),
        "Round 1 responses:".to_string(),
    ];
    for reply in round1 {
        lines.push(format!("- {}: {}", reply.member.label(), reply.text));
    }
    lines.push(String::new());
    lines.push("Round 2 rebuttals:".to_string());
    for reply in round2 {
        lines.push(format!("- {}: {}", reply.member.label(), reply.text));
    }
    lines.push(String::new());
    lines.push("Synthesize the final answer.".to_string());
    lines.join("\n")
}
