//! Outbound side of the message queue.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::Message;

/// Errors raised while handing a message to the network.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The session task that drains outbound messages has gone away.
    #[error("outbound channel closed")]
    ChannelClosed,
    /// The socket failed.
    #[error("socket error: {0}")]
    Socket(String),
    /// A frame could not be encoded or decoded.
    #[error("frame error: {0}")]
    Frame(#[from] serde_json::Error),
}

/// Where the queue publishes real requests.
///
/// Publishing only hands the message over; the reply arrives later through
/// [`super::MessageQueue::reply`].
pub trait Transport: Send {
    /// Publishes one request on the service channel.
    fn publish(&mut self, message: &Message) -> Result<(), TransportError>;
}

/// A [`Transport`] that forwards messages to an async session task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelTransport {
    /// Creates the transport and the receiver the session task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn publish(&mut self, message: &Message) -> Result<(), TransportError> {
        self.tx
            .send(message.clone())
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_until_receiver_dropped() {
        let (mut transport, mut rx) = ChannelTransport::channel();
        transport.publish(&Message::new("whatami")).unwrap();
        assert_eq!(rx.try_recv().unwrap().name, "whatami");

        drop(rx);
        assert!(matches!(
            transport.publish(&Message::new("whatami")),
            Err(TransportError::ChannelClosed)
        ));
    }
}
