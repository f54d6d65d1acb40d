//! Bayeux frames as exchanged on the WebSocket.
//!
//! A socket text frame holds a JSON array of [`BusFrame`]s; a lone object is
//! accepted too.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::Message;
use crate::queue::TransportError;

/// Session start.
pub const HANDSHAKE: &str = "/meta/handshake";
/// Connection keepalive.
pub const CONNECT: &str = "/meta/connect";
/// Session end.
pub const DISCONNECT: &str = "/meta/disconnect";
/// Requests, replies and pushes.
pub const SERVICE: &str = "/service/abacus";
/// Server log lines.
pub const LOG: &str = "/service/log";

/// One frame on the bus.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFrame {
    /// Channel the frame belongs to.
    pub channel: String,
    /// Payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Outcome of a meta request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful: Option<bool>,
    /// Session id assigned by the handshake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Protocol version, sent with the handshake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Transports offered with the handshake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_connection_types: Option<Vec<String>>,
    /// Transport in use, sent with every connect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    /// Error text of a failed meta request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BusFrame {
    /// The handshake that opens every session.
    pub fn handshake() -> Self {
        Self {
            channel: HANDSHAKE.to_string(),
            version: Some("1.0".to_string()),
            supported_connection_types: Some(vec!["websocket".to_string()]),
            ..Default::default()
        }
    }

    /// The connect that keeps the session alive. One is outstanding at all
    /// times; the server answers it when it has something to deliver or its
    /// timeout runs out, and the client answers with the next one.
    pub fn connect(client_id: &str) -> Self {
        Self {
            channel: CONNECT.to_string(),
            client_id: Some(client_id.to_string()),
            connection_type: Some("websocket".to_string()),
            ..Default::default()
        }
    }

    /// A request published on the service channel.
    pub fn publish(message: &Message, client_id: Option<&str>) -> Result<Self, TransportError> {
        Ok(Self {
            channel: SERVICE.to_string(),
            data: Some(serde_json::to_value(message)?),
            client_id: client_id.map(str::to_string),
            ..Default::default()
        })
    }

    /// The Abacus message carried by a service frame.
    pub fn message(&self) -> Result<Option<Message>, TransportError> {
        match &self.data {
            Some(data) => Ok(Some(serde_json::from_value(data.clone())?)),
            None => Ok(None),
        }
    }

    /// The text of a log frame.
    pub fn log_line(&self) -> Option<String> {
        match &self.data {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }
}

/// Encodes frames as one socket message.
pub fn encode(frames: &[BusFrame]) -> Result<String, TransportError> {
    Ok(serde_json::to_string(frames)?)
}

/// Decodes one socket message into frames.
pub fn decode(text: &str) -> Result<Vec<BusFrame>, TransportError> {
    let value: Value = serde_json::from_str(text)?;
    let frames = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Content;

    #[test]
    fn handshake_frame_shape() {
        let text = encode(&[BusFrame::handshake()]).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[0]["channel"], HANDSHAKE);
        assert_eq!(v[0]["supportedConnectionTypes"][0], "websocket");
        assert!(v[0].get("data").is_none());
    }

    #[test]
    fn decodes_service_reply_with_byte_content() {
        let text = r#"[{"channel":"/service/abacus","data":{"name":"ok","headers":{"name":"out"},"content":[104,105]}}]"#;
        let frames = decode(text).unwrap();
        let msg = frames[0].message().unwrap().unwrap();
        assert_eq!(msg.header("name"), Some("out"));
        assert_eq!(msg.content, Some(Content::Bytes(vec![104, 105])));
    }

    #[test]
    fn accepts_single_object() {
        let frames = decode(r#"{"channel":"/meta/handshake","successful":true,"clientId":"c1"}"#).unwrap();
        assert_eq!(frames[0].successful, Some(true));
        assert_eq!(frames[0].client_id.as_deref(), Some("c1"));
    }

    #[test]
    fn connect_frame_shape() {
        let text = encode(&[BusFrame::connect("c1")]).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[0]["channel"], CONNECT);
        assert_eq!(v[0]["clientId"], "c1");
        assert_eq!(v[0]["connectionType"], "websocket");
        assert!(v[0].get("data").is_none());
        assert!(v[0].get("version").is_none());
    }

    #[test]
    fn publish_carries_client_id() {
        let frame = BusFrame::publish(&Message::new("whatami"), Some("c1")).unwrap();
        assert_eq!(frame.channel, SERVICE);
        assert_eq!(frame.data.unwrap()["name"], "whatami");
        assert_eq!(frame.client_id.as_deref(), Some("c1"));
    }
}
