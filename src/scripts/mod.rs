//! Toggleable chat scripts.
//!
//! Every script is a variant of [`Script`] and reacts to one chat line
//! through [`Script::try_handle`]. Side-effect scripts (sounds) never
//! produce chat output and walk-on lookups run detached; command scripts answer `!`-commands; passive
//! scripts look at ordinary chat.

pub mod ask_ai;
pub mod clap;
pub mod mangler;
pub mod markov;
pub mod sound;
pub mod syllables;
pub mod tagger;
pub mod translate;
pub mod weather;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::dispatch::commands::{command_argument, ASK_AI_COMMAND, WEATHER_COMMAND};

pub use ask_ai::{AskAiScript, CompletionService, OpenAiCompletion};
pub use clap::{find_adjective_noun_pair, AdjectiveNounPair, ClapThatScript};
pub use mangler::{ManglerScript, WordMangler};
pub use markov::MarkovEngine;
pub use sound::{HelixStreamStatus, SoundAlertScript, StreamStatus, WalkOnScript};
pub use syllables::{PronunciationDictionary, SyllableSplitter};
pub use tagger::{NlpCloudTagger, PosTagger, TaggedWord};
pub use translate::{GoogleTranslator, TranslateScript, Translator};
pub use weather::{WeatherScript, WeatherService, WttrWeather};

/// What a script sees of one chat line.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub message: &'a str,
    pub username: &'a str,
    pub channel: &'a str,
    pub bot_username: &'a str,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        message: &'a str,
        username: &'a str,
        channel: &'a str,
        bot_username: &'a str,
    ) -> Self {
        Self {
            message,
            username,
            channel,
            bot_username,
        }
    }
}

/// Where a script sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptRole {
    SideEffect,
    Command,
    Passive,
}

/// Script identifiers, declared in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptKind {
    WalkOn,
    SoundAlerts,
    AskAi,
    Weather,
    Mangler,
    Translate,
    ClapThat,
    Markov,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 8] = [
        ScriptKind::WalkOn,
        ScriptKind::SoundAlerts,
        ScriptKind::AskAi,
        ScriptKind::Weather,
        ScriptKind::Mangler,
        ScriptKind::Translate,
        ScriptKind::ClapThat,
        ScriptKind::Markov,
    ];

    /// Config / toggle name.
    pub fn name(self) -> &'static str {
        match self {
            ScriptKind::WalkOn => "walk_on",
            ScriptKind::SoundAlerts => "sound_alerts",
            ScriptKind::AskAi => "ask_ai",
            ScriptKind::Weather => "weather",
            ScriptKind::Mangler => "mangler",
            ScriptKind::Translate => "translate",
            ScriptKind::ClapThat => "clap_that",
            ScriptKind::Markov => "markov",
        }
    }

    pub fn role(self) -> ScriptRole {
        match self {
            ScriptKind::WalkOn | ScriptKind::SoundAlerts => ScriptRole::SideEffect,
            ScriptKind::AskAi | ScriptKind::Weather => ScriptRole::Command,
            ScriptKind::Mangler
            | ScriptKind::Translate
            | ScriptKind::ClapThat
            | ScriptKind::Markov => ScriptRole::Passive,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScriptKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ScriptKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("unknown script '{}'", s))
    }
}

/// A configured script instance.
pub enum Script {
    AskAi(AskAiScript),
    Weather(WeatherScript),
    Translate(TranslateScript),
    Mangler(ManglerScript),
    ClapThat(ClapThatScript),
    Markov(Arc<MarkovEngine>),
    SoundAlerts(SoundAlertScript),
    WalkOn(Arc<WalkOnScript>),
}

impl Script {
    pub fn kind(&self) -> ScriptKind {
        match self {
            Script::AskAi(_) => ScriptKind::AskAi,
            Script::Weather(_) => ScriptKind::Weather,
            Script::Translate(_) => ScriptKind::Translate,
            Script::Mangler(_) => ScriptKind::Mangler,
            Script::ClapThat(_) => ScriptKind::ClapThat,
            Script::Markov(_) => ScriptKind::Markov,
            Script::SoundAlerts(_) => ScriptKind::SoundAlerts,
            Script::WalkOn(_) => ScriptKind::WalkOn,
        }
    }

    /// React to a chat line; `Some` is a line to post.
    pub async fn try_handle(&self, ctx: &ScriptContext<'_>) -> Option<String> {
        match self {
            Script::AskAi(script) => {
                let prompt = command_argument(ctx.message, ASK_AI_COMMAND)?;
                Some(script.handle(prompt).await)
            }
            Script::Weather(script) => {
                let city = command_argument(ctx.message, WEATHER_COMMAND)?;
                Some(script.handle(city).await)
            }
            Script::Translate(script) => script.try_handle(ctx).await,
            Script::Mangler(script) => script.try_handle(ctx),
            Script::ClapThat(script) => script.try_handle(ctx).await,
            Script::Markov(engine) => {
                engine
                    .learn_and_maybe_respond(ctx.channel, ctx.message, ctx.username, ctx.bot_username)
                    .await
            }
            Script::SoundAlerts(script) => {
                script.try_handle(ctx);
                None
            }
            Script::WalkOn(script) => {
                // The stream lookup is an HTTP call; replies never wait on it.
                let script = Arc::clone(script);
                let channel = ctx.channel.to_string();
                let username = ctx.username.to_string();
                tokio::spawn(async move {
                    script.greet(&channel, &username).await;
                });
                None
            }
        }
    }
}
