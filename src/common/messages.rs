//! Canonical message types passed between the transport and the dispatcher.

/// A chat line received from Twitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Channel name without the leading `#`, lowercase.
    pub channel: String,
    /// Login name of the sender, lowercase.
    pub username: String,
    /// Message text as sent.
    pub message: String,
}

impl ChatEvent {
    pub fn new(
        channel: impl Into<String>,
        username: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            channel: normalize_channel(&channel.into()),
            username: username.into().to_lowercase(),
            message: message.into(),
        }
    }
}

/// A chat line to be sent to Twitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Channel name without the leading `#`.
    pub channel: String,
    /// Text to send.
    pub content: String,
}

impl OutgoingMessage {
    pub fn new(channel: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel: normalize_channel(&channel.into()),
            content: content.into(),
        }
    }
}

/// Strip the IRC `#` prefix and lowercase a channel name.
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_channel() {
        assert_eq!(normalize_channel("#SomeStreamer"), "somestreamer");
        assert_eq!(normalize_channel(" other "), "other");
    }

    #[test]
    fn test_chat_event_lowercases_identity() {
        let event = ChatEvent::new("#Chan", "SomeUser", "Hello There");
        assert_eq!(event.channel, "chan");
        assert_eq!(event.username, "someuser");
        assert_eq!(event.message, "Hello There");
    }
}
