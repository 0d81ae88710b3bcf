//! Configuration type definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Default completion endpoint (local GPT4All-style server).
pub const DEFAULT_AI_SERVER_URL: &str = "http://localhost:4891/v1/chat/completions";
/// Default model name sent to the completion server.
pub const DEFAULT_AI_MODEL: &str = "llama3-8b-instruct";
/// Default IRC host.
pub const DEFAULT_IRC_HOST: &str = "irc.chat.twitch.tv";
/// Default plaintext IRC port.
pub const DEFAULT_IRC_PORT: u16 = 6667;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub twitch: TwitchConfig,
    pub scripts: Option<ScriptsConfig>,
    pub ignored_usernames: Option<Vec<String>>,
    pub filters: Option<FiltersConfig>,
    pub ask_ai: Option<AskAiConfig>,
    pub weather: Option<WeatherConfig>,
    pub translate: Option<TranslateConfig>,
    pub mangler: Option<ManglerConfig>,
    pub clap_that: Option<ClapThatConfig>,
    pub markov: Option<MarkovConfig>,
    pub sound_alerts: Option<SoundAlertsConfig>,
    pub walk_on: Option<WalkOnConfig>,
}

impl Config {
    pub fn scripts(&self) -> ScriptsConfig {
        self.scripts.clone().unwrap_or_default()
    }

    pub fn ignored_usernames(&self) -> Vec<String> {
        self.ignored_usernames.clone().unwrap_or_default()
    }

    pub fn blocked_patterns(&self) -> Vec<String> {
        self.filters
            .as_ref()
            .and_then(|f| f.blocked_patterns.clone())
            .unwrap_or_default()
    }

    pub fn ask_ai(&self) -> AskAiConfig {
        self.ask_ai.clone().unwrap_or_default()
    }

    pub fn weather(&self) -> WeatherConfig {
        self.weather.clone().unwrap_or_default()
    }

    pub fn translate(&self) -> TranslateConfig {
        self.translate.clone().unwrap_or_default()
    }

    pub fn mangler(&self) -> ManglerConfig {
        self.mangler.clone().unwrap_or_default()
    }

    pub fn clap_that(&self) -> ClapThatConfig {
        self.clap_that.clone().unwrap_or_default()
    }

    pub fn markov(&self) -> MarkovConfig {
        self.markov.clone().unwrap_or_default()
    }

    pub fn sound_alerts(&self) -> SoundAlertsConfig {
        self.sound_alerts.clone().unwrap_or_default()
    }

    pub fn walk_on(&self) -> WalkOnConfig {
        self.walk_on.clone().unwrap_or_default()
    }
}

/// Twitch account and IRC connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchConfig {
    /// Bot account login name.
    pub username: String,
    /// OAuth token, with or without the `oauth:` prefix.
    pub oauth_token: String,
    /// Application client ID (needed for Helix calls).
    pub client_id: Option<String>,
    /// Channels to join, with or without `#`.
    pub channels: Vec<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl TwitchConfig {
    /// Token formatted for the IRC `PASS` command.
    pub fn irc_password(&self) -> String {
        if self.oauth_token.starts_with("oauth:") {
            self.oauth_token.clone()
        } else {
            format!("oauth:{}", self.oauth_token)
        }
    }

    /// Token without the IRC prefix, for Helix bearer auth.
    pub fn bearer_token(&self) -> &str {
        self.oauth_token
            .strip_prefix("oauth:")
            .unwrap_or(&self.oauth_token)
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or("")
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_IRC_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_IRC_PORT)
    }
}

/// Which scripts start enabled. Missing entries are off.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptsConfig {
    pub ask_ai: Option<bool>,
    pub weather: Option<bool>,
    pub translate: Option<bool>,
    pub mangler: Option<bool>,
    pub clap_that: Option<bool>,
    pub markov: Option<bool>,
    pub sound_alerts: Option<bool>,
    pub walk_on: Option<bool>,
}

impl ScriptsConfig {
    /// Toggle by config name; unknown names are off.
    pub fn is_enabled(&self, name: &str) -> bool {
        let toggle = match name {
            "ask_ai" => self.ask_ai,
            "weather" => self.weather,
            "translate" => self.translate,
            "mangler" => self.mangler,
            "clap_that" => self.clap_that,
            "markov" => self.markov,
            "sound_alerts" => self.sound_alerts,
            "walk_on" => self.walk_on,
            _ => None,
        };
        toggle.unwrap_or(false)
    }
}

/// Extra filtering applied before passive scripts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersConfig {
    /// Regex patterns; a matching message is not shown to passive scripts.
    pub blocked_patterns: Option<Vec<String>>,
}

/// Local OpenAI-compatible completion server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskAiConfig {
    pub server_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_message: Option<String>,
}

impl AskAiConfig {
    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AI_SERVER_URL.to_string())
    }

    /// Model name; blank falls back to the default.
    pub fn model(&self) -> String {
        match self.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => model.to_string(),
            _ => DEFAULT_AI_MODEL.to_string(),
        }
    }

    /// Token budget clamped to 1..=255.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(130).clamp(1, 255)
    }

    pub fn system_message(&self) -> String {
        self.system_message.clone().unwrap_or_default()
    }
}

/// wttr.in settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherConfig {
    /// wttr.in `format` parameter.
    pub format: Option<String>,
}

impl WeatherConfig {
    pub fn format(&self) -> String {
        match self.format.as_deref().map(str::trim) {
            Some(format) if !format.is_empty() => format.to_string(),
            _ => "2".to_string(),
        }
    }
}

/// Translation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateConfig {
    pub target_language: Option<String>,
}

impl TranslateConfig {
    pub fn target_language(&self) -> String {
        match self.target_language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_lowercase(),
            _ => "en".to_string(),
        }
    }
}

/// Syllable mangler settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManglerConfig {
    /// Chance (percent) that a message is mangled at all.
    pub reply_chance_percent: Option<u32>,
    /// Per-syllable replacement probability.
    pub syllable_chance: Option<f64>,
    pub replacement_word: Option<String>,
    /// CMUdict-format pronunciation dictionary.
    pub dictionary_path: Option<PathBuf>,
}

impl ManglerConfig {
    pub fn reply_chance_percent(&self) -> u32 {
        self.reply_chance_percent.unwrap_or(2).clamp(1, 100)
    }

    pub fn syllable_chance(&self) -> f64 {
        self.syllable_chance.unwrap_or(0.3)
    }

    pub fn replacement_word(&self) -> String {
        self.replacement_word
            .clone()
            .unwrap_or_else(|| "butt".to_string())
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.dictionary_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets/cmudict.dict"))
    }
}

/// Adjective/noun reaction settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClapThatConfig {
    pub reply_chance_percent: Option<u32>,
    /// NLP Cloud API key used for part-of-speech tagging.
    pub nlp_api_key: Option<String>,
    pub nlp_model: Option<String>,
}

impl ClapThatConfig {
    pub fn reply_chance_percent(&self) -> u32 {
        self.reply_chance_percent.unwrap_or(2).clamp(1, 100)
    }

    pub fn nlp_api_key(&self) -> String {
        self.nlp_api_key.clone().unwrap_or_default()
    }

    pub fn nlp_model(&self) -> String {
        self.nlp_model
            .clone()
            .unwrap_or_else(|| "en_core_web_lg".to_string())
    }
}

/// Markov brain settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkovConfig {
    /// Directory holding one `markov_brain_<channel>.json` per channel.
    pub brain_dir: Option<PathBuf>,
    /// Accepted messages between generated sentences.
    pub generate_every: Option<u32>,
    /// Maximum words appended after the two seed words.
    pub max_words: Option<usize>,
}

impl MarkovConfig {
    pub fn brain_dir(&self) -> PathBuf {
        self.brain_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn generate_every(&self) -> u32 {
        self.generate_every.unwrap_or(35)
    }

    pub fn max_words(&self) -> usize {
        self.max_words.unwrap_or(20)
    }
}

/// Chat-triggered sounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SoundAlertsConfig {
    /// Trigger text -> audio file.
    pub mappings: Option<HashMap<String, PathBuf>>,
    /// Command used to play a file, e.g. `["paplay"]`; the path is appended.
    pub player_command: Option<Vec<String>>,
}

impl SoundAlertsConfig {
    pub fn mappings(&self) -> HashMap<String, PathBuf> {
        self.mappings.clone().unwrap_or_default()
    }

    pub fn player_command(&self) -> Vec<String> {
        self.player_command.clone().unwrap_or_default()
    }
}

/// Per-user walk-on sounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalkOnConfig {
    /// Username -> audio file.
    pub mappings: Option<HashMap<String, PathBuf>>,
}

impl WalkOnConfig {
    pub fn mappings(&self) -> HashMap<String, PathBuf> {
        self.mappings.clone().unwrap_or_default()
    }
}
