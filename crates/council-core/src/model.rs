// ABOUTME: Core data model for council debates.
// ABOUTME: Providers, members, chat messages, replies, and the serialized debate record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel error recorded in serialized output when no moderator reply exists.
pub const MISSING_MODERATOR: &str = "missing moderator";

/// The LLM backends the council knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    /// All supported providers, in a stable order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// A resolved council member: a provider plus the model it should answer with.
/// Identity is the (provider, model) pair; immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub provider: ProviderKind,
    pub model: String,
}

impl Member {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Display and dedup key, e.g. `anthropic:claude-sonnet-4-5`.
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

/// Role of a chat message in the internal message model. Adapters remap
/// roles to whatever the backend wire format expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the ordered sequence handed to a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One member's reply in a debate phase. A failed call is recorded as an
/// error string with empty text; an empty text with no error is a valid
/// empty response, distinct from failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub member: Member,
    pub text: String,
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(member: Member, text: impl Into<String>) -> Self {
        Self {
            member,
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(member: Member, error: impl Into<String>) -> Self {
        Self {
            member,
            text: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Immutable record of a full debate. Built once by the engine and returned
/// by value; round1 and round2 always hold exactly one reply per configured
/// member, in configured order, failures included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateResult {
    pub prompt: String,
    pub round1: Vec<Reply>,
    pub round2: Vec<Reply>,
    pub moderator: Option<Reply>,
}

/// Provider/model pair as it appears in serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub provider: ProviderKind,
    pub model: String,
}

/// One reply as it appears in serialized output: the member label, the
/// text, and a nullable error string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub member: String,
    pub text: String,
    pub error: Option<String>,
}

impl From<&Reply> for ReplyRecord {
    fn from(reply: &Reply) -> Self {
        Self {
            member: reply.member.label(),
            text: reply.text.clone(),
            error: reply.error.clone(),
        }
    }
}

/// The externally-facing shape of a debate, shared by JSON output and
/// history persistence. The moderator slot is always present; when no
/// moderator reply exists it carries the `missing moderator` sentinel.
/// The timestamp is absent until a history write injects one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub prompt: String,
    pub members: Vec<MemberRecord>,
    pub round1: Vec<ReplyRecord>,
    pub round2: Vec<ReplyRecord>,
    pub moderator: ReplyRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&DebateResult> for DebateRecord {
    fn from(result: &DebateResult) -> Self {
        let moderator = match &result.moderator {
            Some(reply) => ReplyRecord::from(reply),
            None => ReplyRecord {
                member: String::new(),
                text: String::new(),
                error: Some(MISSING_MODERATOR.to_string()),
            },
        };

        Self {
            prompt: result.prompt.clone(),
            members: result
                .round1
                .iter()
                .map(|reply| MemberRecord {
                    provider: reply.member.provider,
                    model: reply.member.model.clone(),
                })
                .collect(),
            round1: result.round1.iter().map(ReplyRecord::from).collect(),
            round2: result.round2.iter().map(ReplyRecord::from).collect(),
            moderator,
            timestamp: None,
        }
    }
}
