//! Second-order word transition table.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Separator between the two words of a key.
pub const KEY_SEPARATOR: char = '|';

/// `"w1|w2"` -> every word observed after that pair, duplicates kept.
///
/// Serializes as a plain JSON object of string arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the key for a word pair.
    pub fn key(first: &str, second: &str) -> String {
        format!("{}{}{}", first, KEY_SEPARATOR, second)
    }

    /// Record every trigram of `words`.
    ///
    /// Trigrams containing the key separator are skipped so that keys
    /// always split back into two words.
    pub fn learn<S: AsRef<str>>(&mut self, words: &[S]) {
        for window in words.windows(3) {
            let (a, b, c) = (window[0].as_ref(), window[1].as_ref(), window[2].as_ref());
            if [a, b, c].iter().any(|w| w.contains(KEY_SEPARATOR)) {
                continue;
            }
            self.entries
                .entry(Self::key(a, b))
                .or_default()
                .push(c.to_string());
        }
    }

    /// Successors observed after `key`.
    pub fn successors(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop keys without successors or with a malformed key.
    ///
    /// Used after loading a file that may have been edited by hand.
    pub fn retain_valid(&mut self) {
        self.entries.retain(|key, successors| {
            !successors.is_empty() && key.split(KEY_SEPARATOR).count() == 2
        });
    }

    /// Generate a sentence from a uniformly chosen seed key.
    pub fn generate<R: Rng + ?Sized>(&self, max_words: usize, rng: &mut R) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.entries.len());
        let seed = self.entries.keys().nth(index)?;
        self.generate_from(seed, max_words, rng)
    }

    /// Random walk starting at `seed`, at most `max_words` steps.
    ///
    /// Stops early when the current pair has no recorded successor.
    pub fn generate_from<R: Rng + ?Sized>(
        &self,
        seed: &str,
        max_words: usize,
        rng: &mut R,
    ) -> Option<String> {
        let (first, second) = seed.split_once(KEY_SEPARATOR)?;
        let mut words = vec![first.to_string(), second.to_string()];

        for _ in 0..max_words {
            let key = Self::key(&words[words.len() - 2], &words[words.len() - 1]);
            let Some(successors) = self.entries.get(&key) else {
                break;
            };
            let Some(next) = successors.choose(&mut *rng) else {
                break;
            };
            words.push(next.clone());
        }

        Some(words.join(" "))
    }
}
