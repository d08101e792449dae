// ABOUTME: Core data model and configuration for the llm-council workspace.
// ABOUTME: Defines providers, members, chat messages, replies, debate results, and typed config.

pub mod config;
pub mod member;
pub mod model;

pub use config::{
    CONFIG_TEMPLATE, ConfigError, CouncilConfig, ProviderConfig, RequestSettings, default_config_path,
    expand_home, resolve_api_key,
};
pub use member::{resolve_members, resolve_moderator};
pub use model::{
    ChatMessage, DebateRecord, DebateResult, MISSING_MODERATOR, Member, MemberRecord, ProviderKind,
    Reply, ReplyRecord, Role,
};
