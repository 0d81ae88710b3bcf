//! Twitch IRC transport.

pub mod client;
pub mod codec;

pub use client::{Disconnect, TwitchClient};
pub use codec::{new_irc_connection, IrcCodec, IrcCommand, IrcConnection, IrcMessage};
