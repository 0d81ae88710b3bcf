//! IRC line codec.
//!
//! Twitch chat speaks plain IRC with IRCv3 tags. Frames are CRLF-terminated
//! lines; a bare LF is accepted on input.

use std::collections::HashMap;
use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

use crate::common::error::TransportError;

/// Twitch allows 8191 bytes of tags plus 512 bytes of message.
pub const MAX_LINE_LENGTH: usize = 8192 + 512;

/// One parsed IRC line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a line without its terminator. Returns `None` for lines with no
    /// command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut message = IrcMessage::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (tags, tail) = tagged.split_once(' ')?;
            message.tags = parse_tags(tags);
            rest = tail.trim_start_matches(' ');
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, tail) = prefixed.split_once(' ')?;
            message.prefix = Some(prefix.to_string());
            rest = tail.trim_start_matches(' ');
        }

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, tail)) => (command, tail),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }
        message.command = command.to_ascii_uppercase();

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                message.params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    message.params.push(param.to_string());
                    rest = tail;
                }
                None => {
                    message.params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(message)
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split(['!', '@']).next().unwrap_or(prefix);
        if nick.is_empty() {
            None
        } else {
            Some(nick)
        }
    }

    /// Last parameter, the message body for PRIVMSG and NOTICE.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|tag| !tag.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (tag.to_string(), String::new()),
        })
        .collect()
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lines the bot sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcCommand {
    Pass(String),
    Nick(String),
    Join(String),
    Part(String),
    Pong(String),
    Privmsg { channel: String, text: String },
}

impl fmt::Display for IrcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrcCommand::Pass(token) => write!(f, "PASS {}", token),
            IrcCommand::Nick(nick) => write!(f, "NICK {}", nick),
            IrcCommand::Join(channel) => write!(f, "JOIN #{}", channel),
            IrcCommand::Part(channel) => write!(f, "PART #{}", channel),
            IrcCommand::Pong(server) => write!(f, "PONG :{}", server),
            IrcCommand::Privmsg { channel, text } => write!(f, "PRIVMSG #{} :{}", channel, text),
        }
    }
}

/// Codec for Twitch IRC lines.
#[derive(Debug, Default)]
pub struct IrcCodec {
    /// Bytes already scanned for a terminator.
    scanned: usize,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for IrcCodec {
    type Item = IrcMessage;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
                if src.len() > MAX_LINE_LENGTH {
                    return Err(TransportError::LineTooLong {
                        max: MAX_LINE_LENGTH,
                    });
                }
                self.scanned = src.len();
                return Ok(None);
            };

            let end = self.scanned + offset;
            self.scanned = 0;
            let line = src.split_to(end);
            src.advance(1);

            if line.len() > MAX_LINE_LENGTH {
                return Err(TransportError::LineTooLong {
                    max: MAX_LINE_LENGTH,
                });
            }

            let text = String::from_utf8_lossy(&line);
            if let Some(message) = IrcMessage::parse(&text) {
                return Ok(Some(message));
            }
        }
    }
}

impl Encoder<IrcCommand> for IrcCodec {
    type Error = TransportError;

    fn encode(&mut self, item: IrcCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // A stray line break would let chat text inject extra commands.
        let line: String = item
            .to_string()
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();

        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// A framed IRC connection.
pub type IrcConnection<S> = Framed<S, IrcCodec>;

/// Create a new IRC connection from a stream.
pub fn new_irc_connection<S: AsyncRead + AsyncWrite>(stream: S) -> IrcConnection<S> {
    Framed::new(stream, IrcCodec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg_with_tags() {
        let line = "@badge-info=;color=#FF0000;display-name=Viewer\\sOne :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :hello there";
        let message = IrcMessage::parse(line).unwrap();

        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(message.tag("color"), Some("#FF0000"));
        assert_eq!(message.tag("display-name"), Some("Viewer One"));
        assert_eq!(message.tag("badge-info"), Some(""));
        assert_eq!(message.nick(), Some("viewer"));
        assert_eq!(message.params, vec!["#chan", "hello there"]);
        assert_eq!(message.trailing(), Some("hello there"));
    }

    #[test]
    fn test_parse_ping_and_numeric() {
        let ping = IrcMessage::parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(ping.command, "PING");
        assert_eq!(ping.prefix, None);
        assert_eq!(ping.trailing(), Some("tmi.twitch.tv"));

        let welcome = IrcMessage::parse(":tmi.twitch.tv 001 minibot :Welcome, GLHF!").unwrap();
        assert_eq!(welcome.command, "001");
        assert_eq!(welcome.nick(), Some("tmi.twitch.tv"));
        assert_eq!(welcome.params, vec!["minibot", "Welcome, GLHF!"]);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse(":prefix.only").is_none());
    }

    #[test]
    fn test_decode_splits_lines() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"PING :a\r\n\r\n:x PRIVMSG #c :hi\nPART"[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.command, "PING");

        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.command, "PRIVMSG");
        assert_eq!(second.trailing(), Some("hi"));

        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b" #c\r\n");
        let third = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(third.command, "PART");
        assert_eq!(third.params, vec!["#c"]);
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_LENGTH + 1].as_slice());
        let err = tokio_test::assert_err!(codec.decode(&mut buf));
        assert!(matches!(err, TransportError::LineTooLong { .. }));
    }

    #[test]
    fn test_encode_commands() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();

        codec.encode(IrcCommand::Pass("oauth:abc".into()), &mut buf).unwrap();
        codec.encode(IrcCommand::Join("chan".into()), &mut buf).unwrap();
        codec
            .encode(
                IrcCommand::Privmsg {
                    channel: "chan".into(),
                    text: "hi\r\nPRIVMSG #other :spam".into(),
                },
                &mut buf,
            )
            .unwrap();

        assert_eq!(
            &buf[..],
            &b"PASS oauth:abc\r\nJOIN #chan\r\nPRIVMSG #chan :hi  PRIVMSG #other :spam\r\n"[..]
        );
    }
}
