//! # Message Envelope
//!
//! Every interaction with the Abacus server is a `Message`: a name, an ordered
//! bag of string headers and, for file transfers, a content blob. Replies reuse
//! the same envelope with the name `ok` or `err`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProtocolError;

/// Header map of a message. Ordered so that logs and tests are stable.
pub type Headers = BTreeMap<String, String>;

/// Headers whose values never reach the message log.
const MASKED_HEADERS: [&str; 2] = ["pass", "newpass"];

/// Body of a message.
///
/// The server sends file contents as an array of byte values; text typed by the
/// user goes out as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Outbound text content.
    Text(String),
    /// Inbound raw bytes.
    Bytes(Vec<u8>),
}

impl Content {
    /// Decodes the content as UTF-8, replacing malformed sequences.
    pub fn to_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Number of units carried, as reported in the message log.
    pub fn len(&self) -> usize {
        match self {
            Content::Text(s) => s.len(),
            Content::Bytes(b) => b.len(),
        }
    }

    /// True when no content is carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// # Abacus Message
///
/// The logical envelope exchanged on the `/service/abacus` channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Message kind, e.g. `auth`, `getproblems`, `ok`.
    pub name: String,
    /// Named string headers.
    #[serde(default)]
    pub headers: Headers,
    /// Optional file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Key of a previously uploaded file, used by `submit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
}

impl Message {
    /// Creates a message with no headers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style header insertion.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Builder-style file key attachment.
    pub fn with_file_key(mut self, key: impl Into<String>) -> Self {
        self.file_key = Some(key.into());
        self
    }

    /// Returns a header value if present.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Returns a header value that the message cannot be processed without.
    pub fn require(&self, key: &str) -> Result<&str, ProtocolError> {
        self.header(key).ok_or_else(|| ProtocolError::MissingHeader {
            message: self.name.clone(),
            header: key.to_string(),
        })
    }

    /// Parses a required header as a number.
    pub fn number<T: FromStr>(&self, key: &str) -> Result<T, ProtocolError> {
        let raw = self.require(key)?;
        raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
            header: key.to_string(),
            value: raw.to_string(),
        })
    }

    /// Content decoded as text, if any was carried.
    pub fn content_text(&self) -> Option<String> {
        self.content.as_ref().map(Content::to_text)
    }

    /// True for a successful reply.
    pub fn is_ok(&self) -> bool {
        self.name == "ok"
    }

    /// True for an error reply.
    pub fn is_err(&self) -> bool {
        self.name == "err"
    }

    /// Renders the message the way the debug log shows it.
    ///
    /// The first line is the caption, the second the message name, followed
    /// by one tab-indented `key:value` line per header. Password headers are
    /// masked.
    pub fn log_text(&self, caption: &str) -> String {
        let mut out = format!("{}\n{}", caption, self.name);
        for (key, value) in &self.headers {
            let shown = if MASKED_HEADERS.contains(&key.as_str()) {
                "********"
            } else {
                value.as_str()
            };
            let _ = write!(out, "\n\t{}:{}", key, shown);
        }
        if let Some(content) = &self.content {
            let _ = write!(out, "\ncontent-length:{}", content.len());
        }
        out
    }
}

/// # Reply
///
/// What a reply handler receives: either a real `ok`/`err` from the server or
/// an `ok` synthesized for a local queue entry, carrying that entry's data.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The reply envelope.
    pub message: Message,
    /// Data attached to a local entry. `None` for server replies.
    pub data: Option<Value>,
}

impl Reply {
    /// Wraps a reply received from the server.
    pub fn from_message(message: Message) -> Self {
        Self { message, data: None }
    }

    /// The synthesized `ok` reply for a handler-only entry.
    pub fn local(data: Value) -> Self {
        Self {
            message: Message::new("ok"),
            data: Some(data),
        }
    }

    /// An `err` reply produced on the client side.
    pub fn error_reply(msg: impl Into<String>) -> Self {
        Self::from_message(Message::new("err").with_header("msg", msg))
    }

    /// True when the reply is `ok`.
    pub fn is_ok(&self) -> bool {
        self.message.is_ok()
    }

    /// The error text of an `err` reply, empty when the server sent none.
    /// `None` for `ok` replies.
    pub fn error(&self) -> Option<&str> {
        if self.message.is_err() {
            Some(self.message.header("msg").unwrap_or(""))
        } else {
            None
        }
    }

    /// Shorthand for [`Message::header`].
    pub fn header(&self, key: &str) -> Option<&str> {
        self.message.header(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_inbound_byte_content() {
        let raw = json!({
            "name": "ok",
            "headers": {"name": "out.txt"},
            "content": [104, 105, 10]
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.content, Some(Content::Bytes(vec![104, 105, 10])));
        assert_eq!(msg.content_text().as_deref(), Some("hi\n"));
    }

    #[test]
    fn serializes_submit_with_file_key() {
        let msg = Message::new("submit")
            .with_header("prob_id", "3")
            .with_header("lang", "C++")
            .with_file_key("k42");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["file_key"], "k42");
        assert_eq!(v["headers"]["lang"], "C++");
        assert!(v.get("content").is_none());
    }

    #[test]
    fn require_and_number_report_errors() {
        let msg = Message::new("ok").with_header("count", "x");
        assert!(matches!(
            msg.require("missing"),
            Err(ProtocolError::MissingHeader { .. })
        ));
        assert!(matches!(
            msg.number::<u32>("count"),
            Err(ProtocolError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn log_text_masks_passwords() {
        let msg = Message::new("auth")
            .with_header("user", "alice")
            .with_header("pass", "secret");
        let text = msg.log_text("Sent");
        assert!(text.starts_with("Sent\nauth"));
        assert!(text.contains("\tuser:alice"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn reply_error_text() {
        let err = Reply::from_message(Message::new("err"));
        assert_eq!(err.error(), Some(""));
        let ok = Reply::local(json!({"k": 1}));
        assert!(ok.is_ok());
        assert_eq!(ok.error(), None);
        assert_eq!(Reply::error_reply("boom").error(), Some("boom"));
    }
}
