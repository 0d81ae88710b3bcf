//! Per-channel learn/generate state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::store::BrainStore;
use super::table::TransitionTable;
use crate::common::normalize_channel;
use crate::dispatch::filter::contains_link;

/// Third-party chat bots whose output is never learned.
pub const KNOWN_BOTS: &[&str] = &[
    "streamelements",
    "nightbot",
    "sery_bot",
    "wizebot",
    "kofistreambot",
    "botrixoficial",
    "tangiabot",
    "moobot",
    "own3d",
    "creatisbot",
    "frostytoolsdotcom",
    "streamlabs",
    "pokemoncommunitygame",
    "fossabot",
    "soundalerts",
    "botbandera",
    "overlayexpert",
    "trackerggbot",
    "songlistbot",
    "commanderroot",
    "instructbot",
    "autogpttest",
    "aerokickbot",
    "streamerelem",
    "ronniabot",
    "tune2livebot",
    "peepostreambot",
    "playwithviewersbot",
    "hexe_bot",
    "super_sweet_bot",
    "streamroutine_bot",
    "remasuri_bot",
    "milanitommasobot",
    "jeetbot",
    "bot584588",
    "lurky_dogg",
];

/// Minimum share of ASCII letters among all letters.
const ENGLISH_RATIO: f64 = 0.7;

/// True when at least 70% of the letters are ASCII. No letters is false.
pub fn is_mostly_english(text: &str) -> bool {
    let (letters, ascii) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(all, ascii), c| {
            (all + 1, ascii + usize::from(c.is_ascii_alphabetic()))
        });

    letters > 0 && ascii as f64 / letters as f64 >= ENGLISH_RATIO
}

pub fn is_known_bot(username: &str) -> bool {
    let username = username.trim().to_lowercase();
    KNOWN_BOTS.contains(&username.as_str())
}

/// Why a message was not learned.
fn rejection_reason(message: &str, username: &str, bot_username: &str) -> Option<&'static str> {
    if message.trim().is_empty() || username.trim().is_empty() {
        return Some("empty message or username");
    }
    if message.starts_with('!') {
        return Some("command");
    }
    if username.trim().eq_ignore_ascii_case(bot_username.trim()) {
        return Some("own message");
    }
    if is_known_bot(username) {
        return Some("known bot");
    }
    if contains_link(message) {
        return Some("contains link");
    }
    if !is_mostly_english(message) {
        return Some("not mostly English");
    }
    None
}

/// Learning-side split: single spaces, empties dropped.
pub fn split_words(message: &str) -> Vec<&str> {
    message.split(' ').filter(|w| !w.is_empty()).collect()
}

/// State of one channel.
#[derive(Debug)]
struct ChannelBrain {
    loaded: bool,
    table: TransitionTable,
    counter: u32,
    rng: StdRng,
}

/// Learns from chat and periodically says something back.
pub struct MarkovEngine {
    store: BrainStore,
    generate_every: u32,
    max_words: usize,
    brains: Mutex<HashMap<String, Arc<AsyncMutex<ChannelBrain>>>>,
    rng: Mutex<StdRng>,
}

impl MarkovEngine {
    pub fn new(store: BrainStore, generate_every: u32, max_words: usize) -> Self {
        Self::with_rng(store, generate_every, max_words, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and tooling.
    pub fn with_seed(store: BrainStore, generate_every: u32, max_words: usize, seed: u64) -> Self {
        Self::with_rng(store, generate_every, max_words, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: BrainStore, generate_every: u32, max_words: usize, rng: StdRng) -> Self {
        Self {
            store,
            generate_every: generate_every.max(1),
            max_words,
            brains: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &BrainStore {
        &self.store
    }

    /// Handle for a channel, created unloaded on first touch.
    fn brain(&self, channel: &str) -> Arc<AsyncMutex<ChannelBrain>> {
        let mut brains = match self.brains.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        brains
            .entry(channel.to_string())
            .or_insert_with(|| {
                let seed = match self.rng.lock() {
                    Ok(mut rng) => rng.gen(),
                    Err(poisoned) => poisoned.into_inner().gen(),
                };
                Arc::new(AsyncMutex::new(ChannelBrain {
                    loaded: false,
                    table: TransitionTable::new(),
                    counter: 0,
                    rng: StdRng::seed_from_u64(seed),
                }))
            })
            .clone()
    }

    /// Load the channel's table from disk if it is not in memory yet.
    async fn ensure_loaded(&self, channel: &str, brain: &mut ChannelBrain) {
        if brain.loaded {
            return;
        }

        let store = self.store.clone();
        let name = channel.to_string();
        brain.table = match tokio::task::spawn_blocking(move || store.load_or_empty(&name)).await {
            Ok(table) => table,
            Err(e) => {
                warn!(channel = %channel, "Brain load task failed: {}", e);
                TransitionTable::new()
            }
        };
        brain.loaded = true;
        info!(channel = %channel, "Markov brain ready ({} keys)", brain.table.len());
    }

    /// Make sure `channel` has its table in memory.
    pub async fn set_channel(&self, channel: &str) {
        let channel = normalize_channel(channel);
        let brain = self.brain(&channel);
        let mut brain = brain.lock().await;
        self.ensure_loaded(&channel, &mut brain).await;
    }

    /// Learn from one chat line; every `generate_every` accepted lines a
    /// generated sentence is returned instead of saving.
    pub async fn learn_and_maybe_respond(
        &self,
        channel: &str,
        message: &str,
        username: &str,
        bot_username: &str,
    ) -> Option<String> {
        if let Some(reason) = rejection_reason(message, username, bot_username) {
            debug!(user = %username, "Markov: skipped ({})", reason);
            return None;
        }

        let channel = normalize_channel(channel);
        let words = split_words(message);

        let brain = self.brain(&channel);
        let mut brain = brain.lock().await;
        self.ensure_loaded(&channel, &mut brain).await;

        if words.len() >= 3 {
            brain.table.learn(&words[..]);
        }
        brain.counter += 1;

        if brain.counter >= self.generate_every {
            brain.counter = 0;
            let ChannelBrain { table, rng, .. } = &mut *brain;
            let sentence = table.generate(self.max_words, rng);
            debug!(channel = %channel, "Markov: generated {:?}", sentence);
            return sentence;
        }

        match BrainStore::encode(&brain.table) {
            Ok(bytes) => {
                if let Err(e) = self.store.save_encoded(&channel, bytes).await {
                    warn!(channel = %channel, "Failed to save brain: {}", e);
                }
            }
            Err(e) => warn!(channel = %channel, "Failed to encode brain: {}", e),
        }

        None
    }

    /// Zero the counter and forget the in-memory table. The file stays.
    pub async fn reset(&self, channel: &str) {
        let channel = normalize_channel(channel);
        let brain = self.brain(&channel);
        let mut brain = brain.lock().await;
        brain.counter = 0;
        brain.table.clear();
        brain.loaded = true;
        info!(channel = %channel, "Markov brain reset");
    }

    /// Accepted messages since the last generation.
    pub async fn counter(&self, channel: &str) -> u32 {
        let brain = self.brain(&normalize_channel(channel));
        let brain = brain.lock().await;
        brain.counter
    }

    /// Copy of the channel's current table.
    pub async fn snapshot(&self, channel: &str) -> TransitionTable {
        let channel = normalize_channel(channel);
        let brain = self.brain(&channel);
        let mut brain = brain.lock().await;
        self.ensure_loaded(&channel, &mut brain).await;
        brain.table.clone()
    }
}
