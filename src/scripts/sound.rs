//! Chat-triggered sounds and per-user walk-on cues.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ScriptContext;
use crate::audio::AudioQueue;
use crate::common::error::{ScriptError, ScriptResult};

const HELIX_STREAMS_URL: &str = "https://api.twitch.tv/helix/streams";

/// Plays a sound when a chat line matches a trigger exactly.
pub struct SoundAlertScript {
    mappings: HashMap<String, PathBuf>,
    queue: AudioQueue,
}

impl SoundAlertScript {
    /// Triggers are matched trimmed and lowercased.
    pub fn new(mappings: HashMap<String, PathBuf>, queue: AudioQueue) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|(trigger, path)| (trigger.trim().to_lowercase(), path))
            .collect();
        Self { mappings, queue }
    }

    /// Returns true when a sound was queued.
    pub fn try_handle(&self, ctx: &ScriptContext<'_>) -> bool {
        let trigger = ctx.message.trim().to_lowercase();
        if trigger.is_empty() {
            return false;
        }

        match self.mappings.get(&trigger) {
            Some(path) => {
                let queued = self.queue.enqueue(path);
                if queued {
                    debug!(user = %ctx.username, "SoundAlert: '{}' -> {}", trigger, path.display());
                }
                queued
            }
            None => false,
        }
    }
}

/// Source of the current stream's start time.
#[async_trait]
pub trait StreamStatus: Send + Sync {
    /// `Some(started_at)` while live, `None` when offline.
    async fn started_at(&self, channel: &str) -> ScriptResult<Option<DateTime<Utc>>>;
}

#[derive(Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<StreamInfo>,
}

#[derive(Deserialize)]
struct StreamInfo {
    started_at: DateTime<Utc>,
}

/// Twitch Helix `GET /streams`.
pub struct HelixStreamStatus {
    client: Client,
    client_id: String,
    bearer_token: String,
}

impl HelixStreamStatus {
    pub fn new(client: Client, client_id: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[async_trait]
impl StreamStatus for HelixStreamStatus {
    async fn started_at(&self, channel: &str) -> ScriptResult<Option<DateTime<Utc>>> {
        let response = self
            .client
            .get(HELIX_STREAMS_URL)
            .query(&[("user_login", channel)])
            .header("Client-ID", &self.client_id)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status {
                status: status.as_u16(),
            });
        }

        let body: StreamsResponse = response.json().await?;
        Ok(body.data.into_iter().next().map(|s| s.started_at))
    }
}

/// Greeting state of one channel.
#[derive(Debug, Default)]
struct WalkOnSession {
    stream_start: Option<DateTime<Utc>>,
    greeted: HashSet<String>,
}

/// Plays a user's walk-on sound on their first message of each stream.
pub struct WalkOnScript {
    mappings: HashMap<String, PathBuf>,
    status: Arc<dyn StreamStatus>,
    queue: AudioQueue,
    sessions: Mutex<HashMap<String, WalkOnSession>>,
}

impl WalkOnScript {
    /// Usernames are matched lowercased.
    pub fn new(
        mappings: HashMap<String, PathBuf>,
        status: Arc<dyn StreamStatus>,
        queue: AudioQueue,
    ) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|(user, path)| (user.trim().to_lowercase(), path))
            .collect();
        Self {
            mappings,
            status,
            queue,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true when a sound was queued.
    pub async fn try_handle(&self, ctx: &ScriptContext<'_>) -> bool {
        self.greet(ctx.channel, ctx.username).await
    }

    /// Queue `username`'s sound if this is their first line of the stream.
    pub async fn greet(&self, channel: &str, username: &str) -> bool {
        let username = username.trim().to_lowercase();
        let Some(path) = self.mappings.get(&username) else {
            return false;
        };

        let started_at = match self.status.started_at(channel).await {
            Ok(Some(started_at)) => started_at,
            Ok(None) => {
                debug!(channel = %channel, "WalkOn: stream offline, skipping");
                return false;
            }
            Err(e) => {
                warn!(channel = %channel, "WalkOn: stream status failed: {}", e);
                return false;
            }
        };

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(channel.to_string()).or_default();

        if session.stream_start != Some(started_at) {
            info!(channel = %channel, "WalkOn: new stream detected (live since {})", started_at);
            session.stream_start = Some(started_at);
            session.greeted.clear();
        }

        if !session.greeted.insert(username.clone()) {
            debug!(user = %username, "WalkOn: already greeted this stream");
            return false;
        }

        info!(user = %username, "WalkOn: playing {}", path.display());
        self.queue.enqueue(path)
    }
}
