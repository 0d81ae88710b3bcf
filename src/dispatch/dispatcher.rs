//! Per-message routing.
//!
//! One chat line goes through, in order:
//! 1. the ignore list (ignored users and the bot itself get nothing),
//! 2. owner commands (`!ignore`, `!unignore`, `!resetbrain`) from the
//!    channel owner, which end processing,
//! 3. side-effect scripts (sound alerts; walk-on lookups are spawned, not awaited),
//! 4. at most one command script (`!askai`, `!weather`), which ends processing,
//! 5. every enabled passive script, run concurrently, results kept in order.

use std::collections::HashSet;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::commands::OwnerCommand;
use super::filter::{IgnoreList, MessageFilter};
use crate::common::ChatEvent;
use crate::scripts::{Script, ScriptContext, ScriptKind, ScriptRole};

pub struct Dispatcher {
    bot_username: String,
    scripts: Vec<Script>,
    enabled: RwLock<HashSet<ScriptKind>>,
    ignored: IgnoreList,
    filter: MessageFilter,
}

impl Dispatcher {
    pub fn new(
        bot_username: impl Into<String>,
        mut scripts: Vec<Script>,
        enabled: impl IntoIterator<Item = ScriptKind>,
        ignored: IgnoreList,
        filter: MessageFilter,
    ) -> Self {
        scripts.sort_by_key(Script::kind);
        Self {
            bot_username: bot_username.into().to_lowercase(),
            scripts,
            enabled: RwLock::new(enabled.into_iter().collect()),
            ignored,
            filter,
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    pub fn ignored(&self) -> &IgnoreList {
        &self.ignored
    }

    /// Turn a script on or off at runtime.
    pub async fn set_enabled(&self, kind: ScriptKind, enabled: bool) {
        let mut set = self.enabled.write().await;
        if enabled {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
        debug!("Script {} {}", kind, if enabled { "enabled" } else { "disabled" });
    }

    pub async fn is_enabled(&self, kind: ScriptKind) -> bool {
        self.enabled.read().await.contains(&kind)
    }

    /// Scripts that are both registered and enabled, in pipeline order.
    async fn active(&self, role: ScriptRole) -> Vec<&Script> {
        let enabled = self.enabled.read().await;
        self.scripts
            .iter()
            .filter(|s| s.kind().role() == role && enabled.contains(&s.kind()))
            .collect()
    }

    /// Process one chat line and return the lines to post, in order.
    pub async fn dispatch(&self, event: &ChatEvent) -> Vec<String> {
        if event.username.eq_ignore_ascii_case(&self.bot_username) {
            return Vec::new();
        }
        if self.ignored.contains(&event.username).await {
            debug!(user = %event.username, "Ignoring message from ignored user");
            return Vec::new();
        }

        // The broadcaster's login is the channel name.
        if event.username == event.channel {
            if let Some(command) = OwnerCommand::parse(&event.message) {
                return vec![self.handle_owner_command(&event.channel, command).await];
            }
        }

        let ctx = ScriptContext::new(
            &event.message,
            &event.username,
            &event.channel,
            &self.bot_username,
        );

        let side_effects = self.active(ScriptRole::SideEffect).await;
        join_all(side_effects.into_iter().map(|s| s.try_handle(&ctx))).await;

        for script in self.active(ScriptRole::Command).await {
            if let Some(reply) = script.try_handle(&ctx).await {
                debug!(user = %event.username, "{} command handled", script.kind());
                return non_blank(reply).into_iter().collect();
            }
        }

        if !self.filter.allows_passive(&event.message) {
            debug!(user = %event.username, "Message filtered from passive scripts");
            return Vec::new();
        }

        let passive = self.active(ScriptRole::Passive).await;
        join_all(passive.into_iter().map(|s| s.try_handle(&ctx)))
            .await
            .into_iter()
            .flatten()
            .filter_map(non_blank)
            .collect()
    }

    async fn handle_owner_command(&self, channel: &str, command: OwnerCommand<'_>) -> String {
        match command {
            OwnerCommand::Ignore("") => "Usage: !ignore username".to_string(),
            OwnerCommand::Unignore("") => "Usage: !unignore username".to_string(),
            OwnerCommand::Ignore(user) => {
                if self.ignored.add(user).await {
                    info!(channel = %channel, "Now ignoring {}", user);
                    format!("Now ignoring {}.", user)
                } else {
                    format!("{} is already ignored.", user)
                }
            }
            OwnerCommand::Unignore(user) => {
                if self.ignored.remove(user).await {
                    info!(channel = %channel, "No longer ignoring {}", user);
                    format!("No longer ignoring {}.", user)
                } else {
                    format!("{} was not ignored.", user)
                }
            }
            OwnerCommand::ResetBrain => {
                let engine = self.scripts.iter().find_map(|script| match script {
                    Script::Markov(engine) => Some(engine),
                    _ => None,
                });
                let Some(engine) = engine else {
                    return "The Markov brain is not loaded.".to_string();
                };
                engine.reset(channel).await;
                if let Err(e) = engine.store().remove(channel) {
                    warn!(channel = %channel, "Failed to delete brain file: {}", e);
                }
                "Markov brain reset.".to_string()
            }
        }
    }
}

fn non_blank(line: String) -> Option<String> {
    if line.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}
