// ABOUTME: Typed configuration for llm-council, loaded from TOML.
// ABOUTME: Deep-merges file contents with built-in defaults once at load time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::ProviderKind;

/// Errors that can occur before any network call is made. These abort the
/// whole invocation; everything later is contained per member.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no council members configured")]
    EmptyCouncil,

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Starter config written by `llm-council init-config`.
pub const CONFIG_TEMPLATE: &str = r#"[council]
members = ["gemini", "anthropic", "openai"]

[moderator]
provider = "openai"
model = "gpt-4.1-mini"

[history]
path = "~/.config/llm-council/history.jsonl"

[request]
timeout_s = 60
temperature = 0.2
max_output_tokens = 1024

[providers.gemini]
api_key_env = "GEMINI_API_KEY"
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta"

[providers.anthropic]
api_key_env = "ANTHROPIC_API_KEY"
model = "claude-sonnet-4-5"
base_url = "https://api.anthropic.com/v1"
version = "2023-06-01"
thinking = { type = "enabled", budget_tokens = 1024 }

[providers.openai]
api_key_env = "OPENAI_API_KEY"
model = "gpt-4.1-mini"
base_url = "https://api.openai.com/v1"
reasoning = { effort = "medium" }
"#;

/// Top-level configuration. Every section falls back to built-in defaults,
/// so a missing or partial file always yields a complete config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    pub council: CouncilSection,
    pub moderator: ModeratorConfig,
    pub history: HistoryConfig,
    pub request: RequestSettings,
    pub providers: Providers,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            council: CouncilSection::default(),
            moderator: ModeratorConfig::default(),
            history: HistoryConfig::default(),
            request: RequestSettings::default(),
            providers: Providers::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilSection {
    pub members: Vec<ProviderKind>,
}

impl Default for CouncilSection {
    fn default() -> Self {
        Self {
            members: vec![
                ProviderKind::Gemini,
                ProviderKind::Anthropic,
                ProviderKind::OpenAi,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeratorConfig {
    /// Falls back to the first council member's provider when unset.
    pub provider: Option<ProviderKind>,
    pub model: String,
}

impl Default for ModeratorConfig {
    fn default() -> Self {
        Self {
            provider: Some(ProviderKind::OpenAi),
            model: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "~/.config/llm-council/history.jsonl".to_string(),
        }
    }
}

/// Request settings shared by every call in a debate. Optional fields are
/// only sent to a backend when present; adapters never invent values the
/// caller did not configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    pub timeout_s: u64,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout_s: 60,
            temperature: Some(0.2),
            max_output_tokens: Some(1024),
        }
    }
}

/// Per-provider settings, one block per supported backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Providers {
    pub gemini: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

impl Providers {
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}

/// Settings for a single provider. `thinking`, `reasoning`, and
/// `generation_config` are opaque blobs handed through to the backend;
/// `request_overrides` is shallow-merged onto the final payload so
/// operators can pass provider-exclusive fields without code changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    pub model: String,
    pub base_url: String,
    pub version: Option<String>,
    pub thinking: Option<Value>,
    pub reasoning: Option<Value>,
    pub generation_config: Option<Value>,
    pub request_overrides: serde_json::Map<String, Value>,
}

impl ProviderConfig {
    /// Built-in defaults for a provider, used to backfill fields the config
    /// file leaves out.
    fn builtin(kind: ProviderKind) -> Self {
        let (api_key_env, base_url, version) = match kind {
            ProviderKind::Gemini => (
                "GEMINI_API_KEY",
                "https://generativelanguage.googleapis.com/v1beta",
                None,
            ),
            ProviderKind::Anthropic => {
                ("ANTHROPIC_API_KEY", "https://api.anthropic.com/v1", Some("2023-06-01"))
            }
            ProviderKind::OpenAi => ("OPENAI_API_KEY", "https://api.openai.com/v1", None),
        };

        Self {
            api_key: None,
            api_key_env: Some(api_key_env.to_string()),
            model: String::new(),
            base_url: base_url.to_string(),
            version: version.map(String::from),
            thinking: None,
            reasoning: None,
            generation_config: None,
            request_overrides: serde_json::Map::new(),
        }
    }

    fn backfill(&mut self, kind: ProviderKind) {
        let builtin = Self::builtin(kind);
        if self.api_key_env.is_none() {
            self.api_key_env = builtin.api_key_env;
        }
        if self.base_url.is_empty() {
            self.base_url = builtin.base_url;
        }
        if self.version.is_none() {
            self.version = builtin.version;
        }
    }
}

impl CouncilConfig {
    /// Load configuration, merging file contents over built-in defaults.
    /// A missing file yields the defaults; a present file must parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            Self::default()
        };

        config.backfill_providers();
        Ok(config)
    }

    /// Parse a config from a TOML string, merging with defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(raw)?;
        config.backfill_providers();
        Ok(config)
    }

    fn backfill_providers(&mut self) {
        self.providers.gemini.backfill(ProviderKind::Gemini);
        self.providers.anthropic.backfill(ProviderKind::Anthropic);
        self.providers.openai.backfill(ProviderKind::OpenAi);
    }
}

/// Resolve the credential for a provider: an explicit `api_key` wins, else
/// the environment variable named by `api_key_env`. Absence is representable
/// so the engine can turn it into a per-member error reply.
pub fn resolve_api_key(provider: &ProviderConfig) -> Option<String> {
    if let Some(key) = &provider.api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    provider
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
}

/// Default config file location: `LLM_COUNCIL_CONFIG` if set, else
/// `~/.config/llm-council/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("LLM_COUNCIL_CONFIG") {
        Ok(path) if !path.is_empty() => expand_home(&path),
        _ => expand_home("~/.config/llm-council/config.toml"),
    }
}

/// Expand a leading `~/` using HOME, matching shell expectations for paths
/// written in config files.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_three_providers() {
        let config = CouncilConfig::from_toml_str("").unwrap();

        assert_eq!(config.council.members.len(), 3);
        assert_eq!(config.moderator.provider, Some(ProviderKind::OpenAi));
        assert_eq!(config.request.timeout_s, 60);
        assert_eq!(config.request.temperature, Some(0.2));
        assert_eq!(config.request.max_output_tokens, Some(1024));

        assert_eq!(
            config.providers.gemini.api_key_env.as_deref(),
            Some("GEMINI_API_KEY")
        );
        assert_eq!(
            config.providers.anthropic.base_url,
            "https://api.anthropic.com/v1"
        );
        assert_eq!(
            config.providers.anthropic.version.as_deref(),
            Some("2023-06-01")
        );
        assert_eq!(config.providers.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let config = CouncilConfig::from_toml_str(
            r#"
            [council]
            members = ["anthropic", "openai"]

            [request]
            timeout_s = 15

            [providers.anthropic]
            model = "claude-sonnet-4-5"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.council.members,
            vec![ProviderKind::Anthropic, ProviderKind::OpenAi]
        );
        // Unset request fields keep their defaults.
        assert_eq!(config.request.timeout_s, 15);
        assert_eq!(config.request.temperature, Some(0.2));
        // Partial provider blocks are backfilled with builtin defaults.
        assert_eq!(config.providers.anthropic.model, "claude-sonnet-4-5");
        assert_eq!(
            config.providers.anthropic.api_key_env.as_deref(),
            Some("ANTHROPIC_API_KEY")
        );
        assert_eq!(
            config.providers.anthropic.base_url,
            "https://api.anthropic.com/v1"
        );
    }

    #[test]
    fn provider_overrides_parse_as_opaque_json() {
        let config = CouncilConfig::from_toml_str(
            r#"
            [providers.openai]
            reasoning = { effort = "high" }
            request_overrides = { service_tier = "flex" }
            "#,
        )
        .unwrap();

        let reasoning = config.providers.openai.reasoning.unwrap();
        assert_eq!(reasoning["effort"], "high");
        assert_eq!(
            config.providers.openai.request_overrides["service_tier"],
            "flex"
        );
    }

    #[test]
    fn explicit_api_key_beats_environment() {
        let provider = ProviderConfig {
            api_key: Some("  sk-explicit  ".to_string()),
            api_key_env: Some("PATH".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(resolve_api_key(&provider).as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let provider = ProviderConfig {
            api_key: None,
            api_key_env: Some("LLM_COUNCIL_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..ProviderConfig::default()
        };
        assert!(resolve_api_key(&provider).is_none());
    }

    #[test]
    fn template_parses_cleanly() {
        let config = CouncilConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.providers.gemini.model, "gemini-2.0-flash");
        assert!(config.providers.anthropic.thinking.is_some());
        assert!(config.providers.openai.reasoning.is_some());
    }

    #[test]
    fn load_reads_file_and_backfills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[council]\nmembers = [\"openai\"]\n\n[providers.openai]\nmodel = \"gpt-4.1-mini\"\n",
        )
        .unwrap();

        let config = CouncilConfig::load(Some(&path)).unwrap();
        assert_eq!(config.council.members, vec![ProviderKind::OpenAi]);
        assert_eq!(config.providers.openai.model, "gpt-4.1-mini");
        assert_eq!(
            config.providers.openai.api_key_env.as_deref(),
            Some("OPENAI_API_KEY")
        );
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "council = not-toml [").unwrap();

        let err = CouncilConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let config = CouncilConfig::load(Some(&path)).unwrap();
        assert_eq!(config.council.members.len(), 3);
    }

    #[test]
    fn expand_home_rewrites_tilde_paths() {
        let expanded = expand_home("~/.config/llm-council/history.jsonl");
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let absolute = expand_home("/var/tmp/history.jsonl");
        assert_eq!(absolute, PathBuf::from("/var/tmp/history.jsonl"));
    }
}
