//! Message pre-filtering.
//!
//! Decides which chat lines the bot looks at at all (ignored users) and
//! which ones passive scripts may react to (no commands, links or
//! configured blocked patterns).

use std::collections::HashSet;

use fancy_regex::Regex;
use tokio::sync::RwLock;
use tracing::warn;

use super::commands::is_command;

/// Substrings that mark a message as containing a link.
pub const LINK_INDICATORS: &[&str] = &["http", ".com", ".net", ".org"];

/// Case-insensitive check for [`LINK_INDICATORS`].
pub fn contains_link(message: &str) -> bool {
    let lower = message.to_lowercase();
    LINK_INDICATORS.iter().any(|indicator| lower.contains(indicator))
}

/// Filter applied before passive scripts.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    patterns: Vec<CompiledPattern>,
}

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug, Clone)]
struct CompiledPattern {
    original: String,
    regex: Regex,
}

impl MessageFilter {
    /// Create a filter from pattern strings.
    ///
    /// Invalid regex patterns are logged and skipped.
    pub fn new(blocked_patterns: Vec<String>) -> Self {
        Self {
            patterns: compile_patterns(blocked_patterns),
        }
    }

    /// Create an empty filter that only applies the built-in rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if the message matches a configured pattern.
    pub fn is_blocked(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| {
            p.regex.is_match(message).unwrap_or_else(|e| {
                warn!("Regex match error for pattern '{}': {}", p.original, e);
                false
            })
        })
    }

    /// True if passive scripts may see this message.
    pub fn allows_passive(&self, message: &str) -> bool {
        !is_command(message) && !contains_link(message) && !self.is_blocked(message)
    }

    pub fn has_patterns(&self) -> bool {
        !self.patterns.is_empty()
    }
}

/// Compile a list of regex pattern strings, skipping invalid ones.
fn compile_patterns(patterns: Vec<String>) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledPattern {
                original: pattern,
                regex,
            }),
            Err(e) => {
                warn!("Invalid filter regex pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Lowercase usernames the bot never reacts to.
#[derive(Debug, Default)]
pub struct IgnoreList {
    users: RwLock<HashSet<String>>,
}

impl IgnoreList {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            users: RwLock::new(
                users
                    .into_iter()
                    .map(|u| normalize_username(u.as_ref()))
                    .filter(|u| !u.is_empty())
                    .collect(),
            ),
        }
    }

    /// Returns false if the user was already ignored.
    pub async fn add(&self, username: &str) -> bool {
        let username = normalize_username(username);
        if username.is_empty() {
            return false;
        }
        self.users.write().await.insert(username)
    }

    /// Returns false if the user was not ignored.
    pub async fn remove(&self, username: &str) -> bool {
        self.users.write().await.remove(&normalize_username(username))
    }

    pub async fn contains(&self, username: &str) -> bool {
        self.users.read().await.contains(&normalize_username(username))
    }

    /// Sorted copy of the list.
    pub async fn snapshot(&self) -> Vec<String> {
        let mut users: Vec<String> = self.users.read().await.iter().cloned().collect();
        users.sort();
        users
    }
}

fn normalize_username(username: &str) -> String {
    username.trim().trim_start_matches('@').to_lowercase()
}
