use anyhow::Result;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::common::error::TransportError;
use crate::common::{normalize_channel, ChatEvent, OutgoingMessage};
use crate::config::types::TwitchConfig;
use crate::dispatch::TransportChannels;

use super::codec::{new_irc_connection, IrcCommand, IrcConnection, IrcMessage};

/// Notices Twitch sends instead of a welcome when the token is bad.
const LOGIN_FAILURE_NOTICES: &[&str] = &["Login authentication failed", "Improperly formatted auth"];

/// Why a connection loop ended without an error.
#[derive(Debug, PartialEq, Eq)]
pub enum Disconnect {
    /// Shutdown was requested.
    Shutdown,
    /// Server asked us to reconnect, or closed the socket.
    Reconnect,
}

/// Actions that line handlers can request from the connection loop.
#[derive(Debug)]
enum HandleLineResult {
    None,
    Reconnect,
}

pub struct TwitchClient {
    config: TwitchConfig,
    pub channels: TransportChannels,
}

impl TwitchClient {
    pub fn new(config: TwitchConfig, channels: TransportChannels) -> Self {
        Self { config, channels }
    }

    /// Connect to the configured IRC server and run until disconnected.
    pub async fn run(&mut self) -> Result<Disconnect> {
        let host = self.config.host().to_string();
        let port = self.config.port();
        info!("Connecting to Twitch IRC at {}:{}", host, port);

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|source| TransportError::ConnectFailed {
                host: host.clone(),
                port,
                source,
            })?;
        self.handle_connection(stream).await
    }

    pub async fn handle_connection<S>(&mut self, stream: S) -> Result<Disconnect>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut connection = new_irc_connection(stream);
        let mut shutdown_rx = self.channels.shutdown_rx.clone();

        self.login(&mut connection).await?;
        info!("Twitch connection established as {}", self.config.username);

        loop {
            tokio::select! {
                line = connection.next() => {
                    match line {
                        Some(Ok(message)) => {
                            match self.handle_line(&mut connection, message).await? {
                                HandleLineResult::None => {}
                                HandleLineResult::Reconnect => return Ok(Disconnect::Reconnect),
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            warn!("{}", TransportError::ConnectionClosed);
                            return Ok(Disconnect::Reconnect);
                        }
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Leaving Twitch chat");
                        for channel in &self.config.channels {
                            let channel = normalize_channel(channel);
                            connection.feed(IrcCommand::Part(channel)).await?;
                        }
                        connection.flush().await?;
                        return Ok(Disconnect::Shutdown);
                    }
                }

                Some(outgoing) = self.channels.outbound_rx.recv() => {
                    self.handle_outgoing_message(&mut connection, outgoing).await?;
                }
            }
        }
    }

    async fn login<S>(&self, connection: &mut IrcConnection<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        connection
            .feed(IrcCommand::Pass(self.config.irc_password()))
            .await?;
        connection
            .feed(IrcCommand::Nick(self.config.username.to_lowercase()))
            .await?;
        for channel in &self.config.channels {
            let channel = normalize_channel(channel);
            debug!("Joining #{}", channel);
            connection.feed(IrcCommand::Join(channel)).await?;
        }
        connection.flush().await?;
        Ok(())
    }

    async fn handle_line<S>(
        &self,
        connection: &mut IrcConnection<S>,
        message: IrcMessage,
    ) -> Result<HandleLineResult>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        match message.command.as_str() {
            "PING" => {
                let server = message.trailing().unwrap_or("tmi.twitch.tv").to_string();
                connection.send(IrcCommand::Pong(server)).await?;
            }
            "PRIVMSG" => self.on_privmsg(&message),
            "NOTICE" => {
                let text = message.trailing().unwrap_or_default();
                if LOGIN_FAILURE_NOTICES.iter().any(|n| text.contains(n)) {
                    return Err(TransportError::LoginFailed {
                        reason: text.to_string(),
                    }
                    .into());
                }
                info!("Twitch notice: {}", text);
            }
            "RECONNECT" => {
                info!("Twitch requested a reconnect");
                return Ok(HandleLineResult::Reconnect);
            }
            "JOIN" => {
                if let (Some(nick), Some(channel)) = (message.nick(), message.params.first()) {
                    if nick.eq_ignore_ascii_case(&self.config.username) {
                        info!("Joined {}", channel);
                    }
                }
            }
            "001" => debug!("Logged in to Twitch IRC"),
            other => debug!("Ignoring IRC command {}", other),
        }
        Ok(HandleLineResult::None)
    }

    fn on_privmsg(&self, message: &IrcMessage) {
        let (Some(username), [channel, text]) = (message.nick(), message.params.as_slice()) else {
            debug!("Malformed PRIVMSG: {:?}", message);
            return;
        };

        let event = ChatEvent::new(channel, username, text);
        if let Err(e) = self.channels.inbound_tx.send(event) {
            warn!("Failed to forward chat message to dispatcher: {}", e);
        }
    }

    async fn handle_outgoing_message<S>(
        &self,
        connection: &mut IrcConnection<S>,
        outgoing: OutgoingMessage,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        if outgoing.content.trim().is_empty() {
            return Ok(());
        }
        debug!(channel = %outgoing.channel, "Sending: {}", outgoing.content);
        connection
            .send(IrcCommand::Privmsg {
                channel: normalize_channel(&outgoing.channel),
                text: outgoing.content,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;
    use crate::dispatch::ChannelBundle;

    fn make_test_config() -> TwitchConfig {
        TwitchConfig {
            username: "MiniBot".to_string(),
            oauth_token: "secret".to_string(),
            client_id: None,
            channels: vec!["#Chan".to_string()],
            host: None,
            port: None,
        }
    }

    async fn read_line<R: tokio::io::AsyncBufRead + Unpin>(reader: &mut R) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn test_session_flow() {
        let bundle = ChannelBundle::new();
        let mut inbound_rx = bundle.dispatch.inbound_rx;
        let outbound_tx = bundle.dispatch.outbound_tx;
        let shutdown_tx = bundle.control.shutdown_tx;
        let mut client = TwitchClient::new(make_test_config(), bundle.transport);

        let (client_stream, server_stream) = tokio::io::duplex(4096);
        let task = tokio::spawn(async move { client.handle_connection(client_stream).await });

        let (read_half, mut write_half) = tokio::io::split(server_stream);
        let mut reader = BufReader::new(read_half);

        assert_eq!(read_line(&mut reader).await, "PASS oauth:secret\r\n");
        assert_eq!(read_line(&mut reader).await, "NICK minibot\r\n");
        assert_eq!(read_line(&mut reader).await, "JOIN #chan\r\n");

        write_half.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "PONG :tmi.twitch.tv\r\n");

        write_half
            .write_all(b"@color=#fff :Viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :hello bot\r\n")
            .await
            .unwrap();
        let event = inbound_rx.recv().await.unwrap();
        assert_eq!(event.channel, "chan");
        assert_eq!(event.username, "viewer");
        assert_eq!(event.message, "hello bot");

        outbound_tx.send(OutgoingMessage::new("chan", "hi there")).unwrap();
        assert_eq!(read_line(&mut reader).await, "PRIVMSG #chan :hi there\r\n");

        shutdown_tx.send(true).unwrap();
        assert_eq!(read_line(&mut reader).await, "PART #chan\r\n");
        assert_eq!(task.await.unwrap().unwrap(), Disconnect::Shutdown);
    }

    #[tokio::test]
    async fn test_reconnect_request() {
        let bundle = ChannelBundle::new();
        let mut client = TwitchClient::new(make_test_config(), bundle.transport);

        let (client_stream, mut server_stream) = tokio::io::duplex(4096);
        let task = tokio::spawn(async move { client.handle_connection(client_stream).await });

        server_stream.write_all(b":tmi.twitch.tv RECONNECT\r\n").await.unwrap();
        assert_eq!(task.await.unwrap().unwrap(), Disconnect::Reconnect);
    }

    #[tokio::test]
    async fn test_login_failure_is_an_error() {
        let bundle = ChannelBundle::new();
        let mut client = TwitchClient::new(make_test_config(), bundle.transport);

        let (client_stream, mut server_stream) = tokio::io::duplex(4096);
        let task = tokio::spawn(async move { client.handle_connection(client_stream).await });

        server_stream
            .write_all(b":tmi.twitch.tv NOTICE * :Login authentication failed\r\n")
            .await
            .unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("Login failed"));
    }

    #[tokio::test]
    async fn test_closed_socket_reconnects() {
        let bundle = ChannelBundle::new();
        let mut client = TwitchClient::new(make_test_config(), bundle.transport);

        let (client_stream, server_stream) = tokio::io::duplex(4096);
        let task = tokio::spawn(async move { client.handle_connection(client_stream).await });

        let mut reader = BufReader::new(server_stream);
        assert_eq!(read_line(&mut reader).await, "PASS oauth:secret\r\n");
        assert_eq!(read_line(&mut reader).await, "NICK minibot\r\n");
        assert_eq!(read_line(&mut reader).await, "JOIN #chan\r\n");
        drop(reader);

        assert_eq!(task.await.unwrap().unwrap(), Disconnect::Reconnect);
    }
}
