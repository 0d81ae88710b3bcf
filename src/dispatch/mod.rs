//! Routing chat lines to scripts.

pub mod channels;
pub mod commands;
pub mod dispatcher;
pub mod filter;

pub use channels::{ChannelBundle, DispatchChannels, TransportChannels};
pub use dispatcher::Dispatcher;
pub use filter::{contains_link, IgnoreList, MessageFilter};
