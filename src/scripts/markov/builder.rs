//! Offline brain building from a chat log.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use super::engine::is_mostly_english;
use super::table::TransitionTable;

/// Shortest line worth learning from.
const MIN_WORDS: usize = 3;

/// Counts from one corpus pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CorpusStats {
    pub learned: usize,
    pub skipped: usize,
}

/// Learn every usable line of `text` into `table`.
///
/// Lines that are commands, mostly non-English or shorter than three words
/// are skipped. Words are split on any whitespace.
pub fn learn_corpus(table: &mut TransitionTable, text: &str) -> CorpusStats {
    let mut stats = CorpusStats::default();

    for line in text.lines() {
        let line = line.trim();
        let words: Vec<&str> = line.split_whitespace().collect();
        if line.starts_with('!') || !is_mostly_english(line) || words.len() < MIN_WORDS {
            stats.skipped += 1;
            continue;
        }
        table.learn(&words[..]);
        stats.learned += 1;
    }

    stats
}

/// A fresh table built from `text` alone.
pub fn build_table(text: &str) -> (TransitionTable, CorpusStats) {
    let mut table = TransitionTable::new();
    let stats = learn_corpus(&mut table, text);
    (table, stats)
}

/// Chat log text. UTF-8 when valid, otherwise Windows-1252.
pub fn decode_chat_log(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode(bytes).0,
    }
}
