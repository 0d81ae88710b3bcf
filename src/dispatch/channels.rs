//! Channel management between the transport and the dispatcher.
//!
//! Groups the queues the IRC client and the dispatcher loop share, so each
//! side receives exactly the halves it needs.

use tokio::sync::{mpsc, watch};

use crate::common::{ChatEvent, OutgoingMessage};

/// Channels owned by the IRC client.
pub struct TransportChannels {
    /// Sender for chat lines read from Twitch.
    pub inbound_tx: mpsc::UnboundedSender<ChatEvent>,
    /// Receiver for lines to post.
    pub outbound_rx: mpsc::UnboundedReceiver<OutgoingMessage>,
    /// Receiver for the shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels owned by the dispatcher loop.
pub struct DispatchChannels {
    /// Receiver for chat lines read from Twitch.
    pub inbound_rx: mpsc::UnboundedReceiver<ChatEvent>,
    /// Sender for lines to post.
    pub outbound_tx: mpsc::UnboundedSender<OutgoingMessage>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created at startup.
pub struct ChannelBundle {
    pub transport: TransportChannels,
    pub dispatch: DispatchChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            transport: TransportChannels {
                inbound_tx,
                outbound_rx,
                shutdown_rx,
            },
            dispatch: DispatchChannels {
                inbound_rx,
                outbound_tx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
