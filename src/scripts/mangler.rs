//! Syllable mangling ("butt bot").
//!
//! Replaces random syllables of a chat line with a joke word while keeping
//! punctuation, spacing and the case pattern of what was replaced.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::syllables::SyllableSplitter;
use super::ScriptContext;

/// A run of the original message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Letters and digits.
    Word(String),
    /// Everything between words: spaces, punctuation, emoji.
    Separator(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(s) | Token::Separator(s) => s,
        }
    }
}

/// Split a message into maximal alphanumeric / non-alphanumeric runs.
///
/// Joining the tokens gives the message back unchanged.
pub fn tokenize(message: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    for c in message.chars() {
        let is_word = c.is_alphanumeric();
        if !current.is_empty() && is_word != in_word {
            tokens.push(make_token(std::mem::take(&mut current), in_word));
        }
        in_word = is_word;
        current.push(c);
    }

    if !current.is_empty() {
        tokens.push(make_token(current, in_word));
    }

    tokens
}

fn make_token(text: String, is_word: bool) -> Token {
    if is_word {
        Token::Word(text)
    } else {
        Token::Separator(text)
    }
}

/// Syllables of one word token plus their replace marks.
#[derive(Debug, Clone)]
struct SyllableList {
    token_index: usize,
    syllables: Vec<String>,
    replace: Vec<bool>,
}

/// Probabilistic syllable replacement.
#[derive(Debug, Clone)]
pub struct WordMangler {
    splitter: SyllableSplitter,
}

impl WordMangler {
    pub fn new(splitter: SyllableSplitter) -> Self {
        Self { splitter }
    }

    /// Replace syllables of `message` with `replacement`.
    ///
    /// Every syllable is replaced with probability `chance`; if none was
    /// picked, one syllable is picked uniformly. Returns `None` when the
    /// message has no word containing a letter.
    pub fn mangle<R: Rng + ?Sized>(
        &self,
        message: &str,
        chance: f64,
        replacement: &str,
        rng: &mut R,
    ) -> Option<String> {
        let tokens = tokenize(message);
        let chance = chance.clamp(0.0, 1.0);

        let mut lists: Vec<SyllableList> = tokens
            .iter()
            .enumerate()
            .filter_map(|(token_index, token)| match token {
                Token::Word(word) if word.chars().any(char::is_alphabetic) => {
                    let syllables = self.splitter.split(word);
                    let replace = syllables.iter().map(|_| rng.gen_bool(chance)).collect();
                    Some(SyllableList {
                        token_index,
                        syllables,
                        replace,
                    })
                }
                _ => None,
            })
            .collect();

        let total: usize = lists.iter().map(|l| l.syllables.len()).sum();
        if total == 0 {
            return None;
        }

        if !lists.iter().any(|l| l.replace.contains(&true)) {
            let mut pick = rng.gen_range(0..total);
            for list in lists.iter_mut() {
                if pick < list.replace.len() {
                    list.replace[pick] = true;
                    break;
                }
                pick -= list.replace.len();
            }
        }

        let mut words: Vec<Option<String>> = vec![None; tokens.len()];
        for list in &lists {
            let rebuilt: String = list
                .syllables
                .iter()
                .zip(&list.replace)
                .map(|(syllable, &replace)| {
                    if replace {
                        match_case(syllable, replacement)
                    } else {
                        syllable.clone()
                    }
                })
                .collect();
            words[list.token_index] = Some(rebuilt);
        }

        Some(
            tokens
                .iter()
                .zip(words)
                .map(|(token, word)| word.unwrap_or_else(|| token.as_str().to_string()))
                .collect(),
        )
    }
}

/// Re-case `replacement` after `original`, character by character.
///
/// Characters past the end of `original` follow its last character;
/// lowercase when `original` is empty.
pub fn match_case(original: &str, replacement: &str) -> String {
    let pattern: Vec<bool> = original.chars().map(char::is_uppercase).collect();
    let trailing_upper = pattern.last().copied().unwrap_or(false);

    replacement
        .chars()
        .enumerate()
        .flat_map(|(i, c)| {
            let upper = pattern.get(i).copied().unwrap_or(trailing_upper);
            let cased: Vec<char> = if upper {
                c.to_uppercase().collect()
            } else {
                c.to_lowercase().collect()
            };
            cased
        })
        .collect()
}

/// Passive script wrapping [`WordMangler`].
pub struct ManglerScript {
    mangler: WordMangler,
    reply_chance_percent: u32,
    syllable_chance: f64,
    replacement_word: String,
    rng: Mutex<StdRng>,
}

impl ManglerScript {
    pub fn new(
        mangler: WordMangler,
        reply_chance_percent: u32,
        syllable_chance: f64,
        replacement_word: impl Into<String>,
    ) -> Self {
        Self::with_rng(
            mangler,
            reply_chance_percent,
            syllable_chance,
            replacement_word,
            StdRng::from_entropy(),
        )
    }

    pub fn with_rng(
        mangler: WordMangler,
        reply_chance_percent: u32,
        syllable_chance: f64,
        replacement_word: impl Into<String>,
        rng: StdRng,
    ) -> Self {
        Self {
            mangler,
            reply_chance_percent: reply_chance_percent.clamp(1, 100),
            syllable_chance,
            replacement_word: replacement_word.into(),
            rng: Mutex::new(rng),
        }
    }

    pub fn try_handle(&self, ctx: &ScriptContext<'_>) -> Option<String> {
        if ctx.message.trim().is_empty() || ctx.username.trim().is_empty() {
            return None;
        }
        if ctx.message.starts_with('!') {
            return None;
        }

        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let roll = rng.gen_range(0..100);
        if roll >= self.reply_chance_percent {
            debug!(
                user = %ctx.username,
                "Mangler: skipped (roll {} >= {})", roll, self.reply_chance_percent
            );
            return None;
        }

        let mangled = self.mangler.mangle(
            ctx.message,
            self.syllable_chance,
            &self.replacement_word,
            &mut *rng,
        )?;

        if mangled == ctx.message {
            debug!("Mangler: result identical to input");
            return None;
        }

        debug!(user = %ctx.username, "Mangler: \"{}\" -> \"{}\"", ctx.message, mangled);
        Some(mangled)
    }
}
