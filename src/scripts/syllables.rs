//! Syllable splitting.
//!
//! Words found in the CMU pronunciation dictionary are cut into as many
//! chunks as they have vowel phonemes; anything else falls back to a
//! vowel-run heuristic.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use fancy_regex::Regex;
use tracing::{info, warn};

use crate::common::error::DictionaryError;

/// Consonants, a vowel run, trailing consonants. `y` counts as a vowel.
static SYLLABLE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new("(?i)[^aeiouy]*[aeiouy]+[^aeiouy]*")
        .map_err(|e| warn!("Invalid syllable pattern: {}", e))
        .ok()
});

/// Word -> syllable segmentation, built once from a CMUdict file.
#[derive(Debug, Default)]
pub struct PronunciationDictionary {
    entries: HashMap<String, Vec<String>>,
}

impl PronunciationDictionary {
    /// Load a CMUdict-format file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let dictionary = Self::parse(&content);
        if dictionary.is_empty() {
            return Err(DictionaryError::Empty {
                path: path.display().to_string(),
            });
        }

        info!(
            "Loaded pronunciation dictionary from {} ({} words)",
            path.display(),
            dictionary.len()
        );
        Ok(dictionary)
    }

    /// Parse CMUdict lines: `WORD  PH1 PH2 ...`.
    ///
    /// `;;;` lines are comments, `WORD(2)` variants index as `word`, and the
    /// first entry for a word wins.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for line in content.lines() {
            if line.starts_with(";;;") || line.trim().is_empty() {
                continue;
            }

            let Some((word, phonemes)) = line.split_once("  ") else {
                continue;
            };

            let word = strip_variant(word.trim()).to_lowercase();
            if word.is_empty() || entries.contains_key(&word) {
                continue;
            }

            let vowels = phonemes
                .split_whitespace()
                .filter(|p| p.ends_with(|c: char| c.is_ascii_digit()))
                .count();

            let segments = proportional_split(&word, vowels);
            entries.insert(word, segments);
        }

        Self { entries }
    }

    /// Segmentation for a lowercase word.
    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `WORD(2)` -> `WORD`.
fn strip_variant(word: &str) -> &str {
    match word.find('(') {
        Some(idx) if word.ends_with(')') => &word[..idx],
        _ => word,
    }
}

/// Cut `word` into `parts` contiguous chunks of near-equal length.
///
/// `parts` is clamped to `1..=len`, so every chunk is non-empty.
fn proportional_split(word: &str, parts: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();
    if len == 0 {
        return vec![String::new()];
    }

    let parts = parts.clamp(1, len);
    // round(i * len / parts)
    let boundary = |i: usize| (2 * i * len + parts) / (2 * parts);

    (0..parts)
        .map(|i| chars[boundary(i)..boundary(i + 1)].iter().collect())
        .collect()
}

/// Splits words into syllables, dictionary first.
#[derive(Debug, Clone, Default)]
pub struct SyllableSplitter {
    dictionary: Option<Arc<PronunciationDictionary>>,
}

impl SyllableSplitter {
    pub fn new(dictionary: Arc<PronunciationDictionary>) -> Self {
        Self {
            dictionary: Some(dictionary),
        }
    }

    /// A splitter that only uses the heuristic.
    pub fn heuristic_only() -> Self {
        Self { dictionary: None }
    }

    /// Load a CMUdict file; when it cannot be read every word uses the
    /// heuristic.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        match PronunciationDictionary::load(path) {
            Ok(dictionary) => Self::new(Arc::new(dictionary)),
            Err(e) => {
                warn!("{}; splitting syllables heuristically", e);
                Self::heuristic_only()
            }
        }
    }

    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    /// Split a word into syllables. Never returns an empty list.
    ///
    /// Segments keep the word's original case, so joining them gives the
    /// word back.
    pub fn split(&self, word: &str) -> Vec<String> {
        if let Some(segments) = self
            .dictionary
            .as_ref()
            .and_then(|d| d.get(&word.to_lowercase()))
        {
            return recase_segments(word, segments);
        }

        heuristic_split(word)
    }
}

/// Slice `word` using the character lengths of lowercase `segments`.
fn recase_segments(word: &str, segments: &[String]) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let total: usize = segments.iter().map(|s| s.chars().count()).sum();
    if total != chars.len() {
        return segments.to_vec();
    }

    let mut start = 0;
    segments
        .iter()
        .map(|segment| {
            let end = start + segment.chars().count();
            let piece: String = chars[start..end].iter().collect();
            start = end;
            piece
        })
        .collect()
}

/// Vowel-run split; the whole word when there is no vowel.
fn heuristic_split(word: &str) -> Vec<String> {
    let Some(pattern) = SYLLABLE_PATTERN.as_ref() else {
        return vec![word.to_string()];
    };

    let syllables: Vec<String> = pattern
        .find_iter(word)
        .filter_map(|m| m.ok())
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if syllables.is_empty() {
        vec![word.to_string()]
    } else {
        syllables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = ";;; # CMUdict sample
;;; comment line
BANANA  B AH0 N AE1 N AH0
BUTTER  B AH1 T ER0
BUTTER(1)  B AH1 T ER0 ER0
HELLO  HH AH0 L OW1
HELLO  HH EH0 L OW1 OW0
PSST  P S S T
";

    fn dictionary() -> Arc<PronunciationDictionary> {
        Arc::new(PronunciationDictionary::parse(SAMPLE))
    }

    #[test]
    fn test_parse_skips_comments_and_variants() {
        let dict = PronunciationDictionary::parse(SAMPLE);
        assert_eq!(dict.len(), 4);
        assert_eq!(dict.get("butter").unwrap(), ["but", "ter"]);
        assert!(dict.get("butter(1)").is_none());
    }

    #[test]
    fn test_first_entry_wins() {
        let dict = PronunciationDictionary::parse(SAMPLE);
        assert_eq!(dict.get("hello").unwrap().len(), 2);
    }

    #[test]
    fn test_proportional_split_covers_word() {
        let dict = PronunciationDictionary::parse(SAMPLE);
        let segments = dict.get("banana").unwrap();
        assert_eq!(segments, ["ba", "na", "na"]);
        assert_eq!(segments.concat(), "banana");
    }

    #[test]
    fn test_word_without_vowel_phonemes_is_one_segment() {
        let dict = PronunciationDictionary::parse(SAMPLE);
        assert_eq!(dict.get("psst").unwrap(), ["psst"]);
    }

    #[test]
    fn test_more_syllables_than_letters_is_clamped() {
        assert_eq!(proportional_split("ab", 5), vec!["a", "b"]);
    }

    #[test]
    fn test_dictionary_split_keeps_case() {
        let splitter = SyllableSplitter::new(dictionary());
        assert_eq!(splitter.split("BaNaNa"), vec!["Ba", "Na", "Na"]);
    }

    #[test]
    fn test_heuristic_split() {
        let splitter = SyllableSplitter::heuristic_only();
        assert_eq!(splitter.split("hello"), vec!["hell", "o"]);
        assert_eq!(splitter.split("Potato"), vec!["Pot", "at", "o"]);
        assert_eq!(splitter.split("rhythm"), vec!["rhythm"]);
    }

    #[test]
    fn test_heuristic_reconstructs_word() {
        let splitter = SyllableSplitter::heuristic_only();
        for word in ["streaming", "Chat", "xyzzy", "a", "strengths", "queueing", "abc123"] {
            let parts = splitter.split(word);
            assert!(!parts.is_empty());
            assert_eq!(parts.concat(), word);
        }
    }

    #[test]
    fn test_no_vowel_word_is_single_syllable() {
        let splitter = SyllableSplitter::heuristic_only();
        assert_eq!(splitter.split("brr"), vec!["brr"]);
    }

    #[test]
    fn test_unknown_word_falls_back_to_heuristic() {
        let splitter = SyllableSplitter::new(dictionary());
        assert_eq!(splitter.split("pogchamp"), vec!["pogch", "amp"]);
    }

    #[test]
    fn test_missing_dictionary_file_falls_back_to_heuristic() {
        let splitter = SyllableSplitter::from_file("/nonexistent/cmudict.dict");
        assert!(!splitter.has_dictionary());
        assert_eq!(splitter.split("pogchamp"), vec!["pogch", "amp"]);
    }

    #[test]
    fn test_dictionary_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"BUTTER  B AH1 T ER0\n").unwrap();

        let splitter = SyllableSplitter::from_file(file.path());
        assert!(splitter.has_dictionary());
        assert_eq!(splitter.split("Butter"), vec!["But", "ter"]);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = PronunciationDictionary::load("/nonexistent/cmudict.dict").unwrap_err();
        assert!(matches!(err, DictionaryError::Io { .. }));
    }
}
