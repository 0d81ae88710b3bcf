//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Twitch account
    if config.twitch.username.trim().is_empty() {
        errors.push("twitch.username is required".to_string());
    }
    if config.twitch.oauth_token.trim().is_empty() {
        errors.push("twitch.oauth_token is required".to_string());
    }
    if config.twitch.oauth_token == "YOUR_OAUTH_TOKEN_HERE" {
        errors.push("twitch.oauth_token has not been configured (still using placeholder)".to_string());
    }
    if config.twitch.channels.is_empty() {
        errors.push("twitch.channels is empty - nothing to join".to_string());
    }
    for (i, channel) in config.twitch.channels.iter().enumerate() {
        if channel.trim().trim_start_matches('#').is_empty() {
            errors.push(format!("twitch.channels[{}] is blank", i));
        }
    }
    if config.twitch.port() == 0 {
        errors.push("twitch.port must be non-zero".to_string());
    }

    let scripts = config.scripts();

    // Mangler
    let mangler = config.mangler();
    let chance = mangler.syllable_chance();
    if !(chance > 0.0 && chance <= 1.0) {
        errors.push(format!(
            "mangler.syllable_chance must be in (0, 1] (got {})",
            chance
        ));
    }
    if mangler.replacement_word().trim().is_empty() {
        errors.push("mangler.replacement_word must not be blank".to_string());
    }

    // Clap reactor needs a tagger
    if scripts.clap_that.unwrap_or(false) && config.clap_that().nlp_api_key().trim().is_empty() {
        errors.push("clap_that is enabled but clap_that.nlp_api_key is not set".to_string());
    }

    // Walk-on needs Helix credentials
    if scripts.walk_on.unwrap_or(false) && config.twitch.client_id().trim().is_empty() {
        errors.push("walk_on is enabled but twitch.client_id is not set".to_string());
    }

    // Markov
    if config.markov().generate_every() == 0 {
        errors.push("markov.generate_every must be at least 1".to_string());
    }

    // Validate filter patterns (try to compile them)
    for (i, pattern) in config.blocked_patterns().iter().enumerate() {
        if Regex::new(pattern).is_err() {
            errors.push(format!(
                "filters.blocked_patterns[{}] is not a valid regex: '{}'",
                i, pattern
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        Config {
            twitch: TwitchConfig {
                username: "minibot".to_string(),
                oauth_token: "abc123".to_string(),
                client_id: Some("cid".to_string()),
                channels: vec!["somestreamer".to_string()],
                host: None,
                port: None,
            },
            scripts: Some(ScriptsConfig {
                markov: Some(true),
                mangler: Some(true),
                ..Default::default()
            }),
            ignored_usernames: None,
            filters: None,
            ask_ai: None,
            weather: None,
            translate: None,
            mangler: None,
            clap_that: None,
            markov: None,
            sound_alerts: None,
            walk_on: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.twitch.oauth_token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("twitch.oauth_token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.twitch.oauth_token = "YOUR_OAUTH_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_no_channels_fails() {
        let mut config = make_valid_config();
        config.twitch.channels.clear();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("twitch.channels"));
    }

    #[test]
    fn test_syllable_chance_out_of_range_fails() {
        let mut config = make_valid_config();
        config.mangler = Some(ManglerConfig {
            syllable_chance: Some(0.0),
            ..Default::default()
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("syllable_chance"));
    }

    #[test]
    fn test_clap_without_key_fails() {
        let mut config = make_valid_config();
        config.scripts = Some(ScriptsConfig {
            clap_that: Some(true),
            ..Default::default()
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("nlp_api_key"));
    }

    #[test]
    fn test_invalid_regex_filter_fails() {
        let mut config = make_valid_config();
        config.filters = Some(FiltersConfig {
            blocked_patterns: Some(vec!["[invalid".to_string()]),
        });

        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a valid regex"));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = make_valid_config();
        config.twitch.username = String::new();
        config.twitch.channels.clear();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("twitch.username"));
        assert!(message.contains("twitch.channels"));
    }
}
