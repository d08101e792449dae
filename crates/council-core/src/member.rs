// ABOUTME: Resolves configured council members and the moderator into concrete Members.
// ABOUTME: Model and credential presence are deferred to call time so failures attribute per member.

use crate::config::{ConfigError, CouncilConfig};
use crate::model::Member;

/// Resolve the ordered council roster from configuration. Each member picks
/// up its provider's configured model; an empty model is allowed here and
/// handled at call time. An empty council is a fatal configuration error.
pub fn resolve_members(config: &CouncilConfig) -> Result<Vec<Member>, ConfigError> {
    let members: Vec<Member> = config
        .council
        .members
        .iter()
        .map(|&kind| Member::new(kind, config.providers.get(kind).model.clone()))
        .collect();

    if members.is_empty() {
        return Err(ConfigError::EmptyCouncil);
    }
    Ok(members)
}

/// Resolve the moderator. When no moderator provider is configured, the
/// first council member's provider stands in.
pub fn resolve_moderator(config: &CouncilConfig, members: &[Member]) -> Option<Member> {
    let provider = config
        .moderator
        .provider
        .or_else(|| members.first().map(|m| m.provider))?;
    Some(Member::new(provider, config.moderator.model.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderKind;

    #[test]
    fn members_resolve_in_configured_order() {
        let config = CouncilConfig::from_toml_str(
            r#"
            [council]
            members = ["openai", "gemini"]

            [providers.openai]
            model = "gpt-4.1-mini"
            "#,
        )
        .unwrap();

        let members = resolve_members(&config).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].provider, ProviderKind::OpenAi);
        assert_eq!(members[0].model, "gpt-4.1-mini");
        assert_eq!(members[1].provider, ProviderKind::Gemini);
        // Gemini has no configured model; that is resolved at call time.
        assert_eq!(members[1].model, "");
    }

    #[test]
    fn empty_council_is_a_config_error() {
        let config = CouncilConfig::from_toml_str("[council]\nmembers = []\n").unwrap();
        let err = resolve_members(&config).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCouncil));
    }

    #[test]
    fn moderator_falls_back_to_first_member_provider() {
        let mut config = CouncilConfig::from_toml_str(
            r#"
            [council]
            members = ["anthropic", "gemini"]

            [moderator]
            model = "claude-sonnet-4-5"
            "#,
        )
        .unwrap();
        config.moderator.provider = None;

        let members = resolve_members(&config).unwrap();
        let moderator = resolve_moderator(&config, &members).unwrap();
        assert_eq!(moderator.provider, ProviderKind::Anthropic);
        assert_eq!(moderator.model, "claude-sonnet-4-5");
    }

    #[test]
    fn configured_moderator_provider_wins() {
        let config = CouncilConfig::from_toml_str(
            r#"
            [council]
            members = ["gemini"]

            [moderator]
            provider = "openai"
            "#,
        )
        .unwrap();

        let members = resolve_members(&config).unwrap();
        let moderator = resolve_moderator(&config, &members).unwrap();
        assert_eq!(moderator.provider, ProviderKind::OpenAi);
    }
}
