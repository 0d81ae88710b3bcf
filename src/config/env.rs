//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `MINIBOT_TWITCH_USERNAME` - Bot account login
//! - `MINIBOT_TWITCH_OAUTH_TOKEN` - OAuth token
//! - `MINIBOT_TWITCH_CLIENT_ID` - Application client ID
//! - `MINIBOT_TWITCH_CHANNELS` - Comma separated channel list
//! - `MINIBOT_NLP_API_KEY` - NLP Cloud key for the clap reactor

use std::env;

use crate::config::types::{ClapThatConfig, Config};

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "MINIBOT";

/// Apply environment variable overrides to a config.
///
/// This allows tokens and keys to be provided via environment variables
/// instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(username) = env::var(format!("{}_TWITCH_USERNAME", ENV_PREFIX)) {
        config.twitch.username = username;
    }
    if let Ok(token) = env::var(format!("{}_TWITCH_OAUTH_TOKEN", ENV_PREFIX)) {
        config.twitch.oauth_token = token;
    }
    if let Ok(client_id) = env::var(format!("{}_TWITCH_CLIENT_ID", ENV_PREFIX)) {
        config.twitch.client_id = Some(client_id);
    }
    if let Ok(channels) = env::var(format!("{}_TWITCH_CHANNELS", ENV_PREFIX)) {
        let channels = parse_channel_list(&channels);
        if !channels.is_empty() {
            config.twitch.channels = channels;
        }
    }

    if let Ok(key) = env::var(format!("{}_NLP_API_KEY", ENV_PREFIX)) {
        config
            .clap_that
            .get_or_insert_with(ClapThatConfig::default)
            .nlp_api_key = Some(key);
    }

    config
}

/// Split a comma separated channel list, dropping blanks.
fn parse_channel_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `MINIBOT_CONFIG` environment variable, otherwise returns "minibot.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "minibot.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_test_config() -> Config {
        Config {
            twitch: TwitchConfig {
                username: "minibot".to_string(),
                oauth_token: "original_token".to_string(),
                client_id: None,
                channels: vec!["somestreamer".to_string()],
                host: None,
                port: None,
            },
            scripts: None,
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
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "MINIBOT");
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(
            parse_channel_list(" one, #two ,,three "),
            vec!["one", "#two", "three"]
        );
        assert!(parse_channel_list(" , ").is_empty());
    }

    #[test]
    fn test_apply_env_overrides_no_vars() {
        env::remove_var("MINIBOT_TWITCH_OAUTH_TOKEN");
        env::remove_var("MINIBOT_TWITCH_CHANNELS");
        env::remove_var("MINIBOT_NLP_API_KEY");

        let config = make_test_config();
        let result = apply_env_overrides(config);

        assert_eq!(result.twitch.oauth_token, "original_token");
        assert_eq!(result.twitch.channels, vec!["somestreamer"]);
        assert!(result.clap_that.is_none());
    }
}
