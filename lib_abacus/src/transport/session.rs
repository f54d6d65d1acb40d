//! # Session Loop
//!
//! Owns the [`AbacusClient`] and the WebSocket. One task multiplexes socket
//! reads, requests published by the queue, user commands, the countdown tick
//! and shutdown, so the client state is only ever touched from here.
//!
//! A successful handshake is followed by `/meta/connect`, and every connect
//! reply by the next one, so the server never expires the session. A
//! rejected connect starts over with a new handshake.
//!
//! A lost socket marks the client disconnected; after the reconnect delay a
//! new socket is opened and handshaken, and the handshake reply starts a
//! fresh client session.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use super::bus::{self, BusFrame};
use crate::client::{AbacusClient, ClientCommand, ClientSettings};
use crate::protocol::Message;
use crate::queue::{ChannelTransport, TransportError};
use crate::ui::UiSink;

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the Abacus server's bus.
    pub url: String,
    /// Pause before reconnecting after a lost socket.
    pub reconnect_delay: Duration,
    /// Countdown tick period.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:7368/cometd".to_string(),
            reconnect_delay: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// Why one socket session ended.
enum Ended {
    /// Shutdown was requested.
    Shutdown,
    /// The socket failed or closed.
    Lost,
}

/// Runs the client until shutdown.
///
/// Returns an error only for a configuration the loop can never recover
/// from, such as an unparsable URL.
pub async fn run(
    config: SessionConfig,
    settings: ClientSettings,
    ui: UiSink,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), TransportError> {
    let url = Url::parse(&config.url)
        .map_err(|e| TransportError::Socket(format!("invalid url '{}': {}", config.url, e)))?;

    let (transport, mut outbound) = ChannelTransport::channel();
    let mut client = AbacusClient::new(settings, Box::new(transport), ui);

    loop {
        if shutdown.try_recv().is_ok() {
            break;
        }
        log::info!("Connecting to Abacus server: {}", url);

        match connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => {
                log::info!("Connected to Abacus server");
                let ended = drive(
                    &config,
                    ws_stream,
                    &mut client,
                    &mut outbound,
                    &mut commands,
                    &mut shutdown,
                )
                .await;
                client.set_connected(false);
                if let Ended::Shutdown = ended {
                    break;
                }
            }
            Err(e) => {
                log::error!("Failed to connect to Abacus server: {}", e);
            }
        }

        log::info!("Reconnecting in {}s", config.reconnect_delay.as_secs());
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    log::info!("Session loop stopped");
    Ok(())
}

async fn drive(
    config: &SessionConfig,
    ws_stream: WsStream,
    client: &mut AbacusClient,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
    shutdown: &mut broadcast::Receiver<()>,
) -> Ended {
    let (mut write, mut read) = ws_stream.split();
    let mut client_id: Option<String> = None;
    let mut tick = tokio::time::interval(config.tick_interval);

    if let Err(e) = send_frame(&mut write, BusFrame::handshake()).await {
        log::error!("Failed to send handshake: {}", e);
        return Ended::Lost;
    }

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Session shutting down...");
                let _ = write.close().await;
                return Ended::Shutdown;
            }
            Some(message) = outbound.recv() => {
                let text = match BusFrame::publish(&message, client_id.as_deref()).and_then(|f| bus::encode(&[f])) {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("Failed to encode '{}': {}", message.name, e);
                        continue;
                    }
                };
                if let Err(e) = write.send(WsMessage::Text(text.into())).await {
                    log::error!("Failed to send '{}': {}", message.name, e);
                    return Ended::Lost;
                }
            }
            Some(command) = commands.recv() => {
                client.apply(command);
            }
            _ = tick.tick() => {
                client.tick();
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        match bus::decode(text.as_str()) {
                            Ok(frames) => {
                                let answers: Vec<BusFrame> = frames
                                    .into_iter()
                                    .filter_map(|frame| handle_frame(client, outbound, &mut client_id, frame))
                                    .collect();
                                for answer in answers {
                                    let channel = answer.channel.clone();
                                    if let Err(e) = send_frame(&mut write, answer).await {
                                        log::error!("Failed to send {}: {}", channel, e);
                                        return Ended::Lost;
                                    }
                                }
                            }
                            Err(e) => log::warn!("Discarding undecodable frame: {}", e),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        log::warn!("Abacus server closed the connection");
                        return Ended::Lost;
                    }
                    Some(Err(e)) => {
                        log::error!("Socket error: {}", e);
                        return Ended::Lost;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn send_frame(write: &mut WsSink, frame: BusFrame) -> Result<(), TransportError> {
    let text = bus::encode(&[frame])?;
    write
        .send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| TransportError::Socket(e.to_string()))
}

/// Applies one inbound frame. Returns the meta frame to send back, if any.
fn handle_frame(
    client: &mut AbacusClient,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
    client_id: &mut Option<String>,
    frame: BusFrame,
) -> Option<BusFrame> {
    match frame.channel.as_str() {
        bus::HANDSHAKE => {
            let successful = frame.successful.unwrap_or(false);
            let mut answer = None;
            if successful {
                *client_id = frame.client_id.clone();
                // Requests from the previous socket will never be answered.
                let mut stale = 0;
                while outbound.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    log::warn!("Dropped {} request(s) queued before the handshake", stale);
                }
                client.set_connected(true);
                match client_id.as_deref() {
                    Some(id) => answer = Some(BusFrame::connect(id)),
                    None => log::warn!("Handshake reply carried no client id"),
                }
            } else {
                log::warn!("Handshake rejected: {}", frame.error.as_deref().unwrap_or("no reason given"));
            }
            client.handshake(successful);
            answer
        }
        bus::CONNECT => {
            let successful = frame.successful.unwrap_or(false);
            client.set_connected(successful);
            if successful {
                client_id.as_deref().map(BusFrame::connect)
            } else {
                log::warn!("Connect rejected: {}; handshaking again", frame.error.as_deref().unwrap_or("no reason given"));
                Some(BusFrame::handshake())
            }
        }
        bus::DISCONNECT => {
            client.set_connected(false);
            None
        }
        bus::SERVICE => {
            match frame.message() {
                Ok(Some(message)) => client.on_message(message),
                Ok(None) => log::debug!("Service frame without data (ack)"),
                Err(e) => log::warn!("Discarding malformed service message: {}", e),
            }
            None
        }
        bus::LOG => {
            if let Some(line) = frame.log_line() {
                client.on_log_line(&line);
            }
            None
        }
        other => {
            log::debug!("Ignoring frame on channel '{}'", other);
            None
        }
    }
}
