//! Configuration file parsing (HOCON format).

use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::Config;
use hocon::HoconLoader;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        twitch {
            username = "minibot"
            oauth_token = "abc123"
            channels = ["somestreamer"]
        }
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_str(MINIMAL).unwrap();
        assert_eq!(config.twitch.username, "minibot");
        assert_eq!(config.twitch.host(), "irc.chat.twitch.tv");
        assert_eq!(config.twitch.port(), 6667);
        assert_eq!(config.scripts().markov, None);
        assert_eq!(config.markov().generate_every(), 35);
        assert_eq!(config.markov().max_words(), 20);
        assert_eq!(config.mangler().replacement_word(), "butt");
        assert_eq!(config.weather().format(), "2");
        assert_eq!(config.translate().target_language(), "en");
        assert!(config.ignored_usernames().is_empty());
    }

    #[test]
    fn test_full_sections() {
        let config = load_config_str(
            r##"
            twitch {
                username = "minibot"
                oauth_token = "oauth:abc123"
                client_id = "cid"
                channels = ["one", "#two"]
            }
            scripts { markov = true, mangler = true }
            ignored_usernames = ["nightbot", "SomeUser"]
            mangler {
                reply_chance_percent = 10
                syllable_chance = 0.5
                replacement_word = "meme"
            }
            markov { brain_dir = "brains", generate_every = 10 }
            sound_alerts {
                mappings { "!boom" = "sounds/boom.wav" }
            }
            "##,
        )
        .unwrap();

        let scripts = config.scripts();
        assert_eq!(scripts.markov, Some(true));
        assert_eq!(scripts.mangler, Some(true));
        assert_eq!(scripts.ask_ai, None);
        assert!(scripts.is_enabled("markov"));
        assert!(!scripts.is_enabled("ask_ai"));
        assert!(!scripts.is_enabled("nonsense"));
        assert_eq!(config.twitch.channels.len(), 2);
        assert_eq!(config.twitch.client_id(), "cid");
        assert_eq!(config.ignored_usernames()[1], "SomeUser");
        assert_eq!(config.mangler().reply_chance_percent(), 10);
        assert_eq!(config.mangler().replacement_word(), "meme");
        assert_eq!(config.markov().generate_every(), 10);
        assert_eq!(config.markov().max_words(), 20);
        assert!(config.sound_alerts().mappings().contains_key("!boom"));
    }

    #[test]
    fn test_missing_twitch_section_fails() {
        assert!(load_config_str("scripts { markov = true }").is_err());
    }

    #[test]
    fn test_irc_password_prefix() {
        let config = load_config_str(MINIMAL).unwrap();
        assert_eq!(config.twitch.irc_password(), "oauth:abc123");
        assert_eq!(config.twitch.bearer_token(), "abc123");
    }
}
