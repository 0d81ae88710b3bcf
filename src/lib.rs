//! MiniBot - a Twitch chat bot with toggleable scripts.
//!
//! Chat lines arrive over IRC ([`twitch`]), go through the [`dispatch`]
//! pipeline and reach the [`scripts`]: AI answers, weather, translation,
//! syllable mangling, adjective/noun reactions, sound cues and a
//! self-learning Markov brain.

pub mod audio;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod scripts;
pub mod twitch;
