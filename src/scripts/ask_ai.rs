//! `!askai <prompt>` against a local OpenAI-compatible server.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::error::{ScriptError, ScriptResult};
use crate::config::AskAiConfig;

pub const ASK_AI_USAGE: &str = "You need to provide a prompt after !askai!";
pub const NO_REPLY: &str = "Sorry, no reply from AI.";

/// Longest reply posted to chat, leaving room for the prefix Twitch adds.
pub const MAX_REPLY_CHARS: usize = 490;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Reply text for a prompt. May be blank.
    async fn complete(&self, prompt: &str) -> ScriptResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// `POST /v1/chat/completions` client.
pub struct OpenAiCompletion {
    client: Client,
    server_url: String,
    model: String,
    max_tokens: u32,
    system_message: String,
}

impl OpenAiCompletion {
    pub fn new(client: Client, config: &AskAiConfig) -> Self {
        Self {
            client,
            server_url: config.server_url(),
            model: config.model(),
            max_tokens: config.max_tokens(),
            system_message: config.system_message(),
        }
    }

    fn request<'a>(&'a self, prompt: &'a str) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_message.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.system_message,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        CompletionRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> ScriptResult<String> {
        let response = self
            .client
            .post(&self.server_url)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status {
                status: status.as_u16(),
            });
        }

        let body: CompletionResponse = response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or_default())
    }
}

/// Cut replies longer than [`MAX_REPLY_CHARS`] and mark the cut with `...`.
pub fn truncate_reply(reply: &str) -> String {
    if reply.chars().count() <= MAX_REPLY_CHARS {
        return reply.trim().to_string();
    }

    let cut: String = reply.chars().take(MAX_REPLY_CHARS).collect();
    format!("{}...", cut.trim_end()).trim().to_string()
}

/// Command handler; always produces a chat line.
pub struct AskAiScript {
    service: Arc<dyn CompletionService>,
}

impl AskAiScript {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub async fn handle(&self, prompt: &str) -> String {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return ASK_AI_USAGE.to_string();
        }

        debug!("AskAI: sending prompt \"{}\"", prompt);
        match self.service.complete(prompt).await {
            Ok(reply) if reply.trim().is_empty() => NO_REPLY.to_string(),
            Ok(reply) => truncate_reply(&reply),
            Err(e) => {
                warn!("AskAI: request failed: {}", e);
                format!("Error contacting AI: {}", e)
            }
        }
    }
}
