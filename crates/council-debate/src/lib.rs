// ABOUTME: Debate orchestration for llm-council: the provider contract, backend adapters,
// ABOUTME: and the three-phase engine (independent answers, cross-critique, moderation).

pub mod engine;
pub mod provider;
pub mod providers;
pub mod testing;

pub use engine::{DebateEngine, MODERATOR_SYSTEM, ROUND1_SYSTEM, ROUND2_SYSTEM};
pub use provider::{ChatOutcome, ChatProvider, ProviderError};
pub use providers::default_providers;
