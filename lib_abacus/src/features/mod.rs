//! # Feature Modules
//!
//! Each module owns one slice of [`ClientState`] and mutates it only from its
//! own reply and push handlers. Operations take the state and a
//! [`ClientScheduler`] so they can be called both from a user command and from
//! inside another handler without changing queue ordering.
//!
//! ## Modules:
//!
//! - **`session`**: connection flag, login/logout, permissions, reset.
//! - **`problems`**: problem and language catalogues.
//! - **`clarifications`**: requests, replies and their dialogs.
//! - **`submissions`**: submission list, submitting, file retrieval.
//! - **`contest_status`**: countdown and standings freeze.
//! - **`standings`**: message-channel standings and the live filter.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Clarification requests and replies.
pub mod clarifications;
/// Contest clock.
pub mod contest_status;
/// Problem and language catalogues.
pub mod problems;
/// Connection and login state.
pub mod session;
/// Standings fed from the message channel.
pub mod standings;
/// Submissions.
pub mod submissions;

use std::cmp::Ordering;

use crate::client::ClientState;
use crate::protocol::{IndexedRecord, ProtocolError, Reply};
use crate::queue::{HandlerResult, Scheduler};

/// Scheduler over the client's queue.
pub type ClientScheduler<'a> = Scheduler<'a, ClientState>;

/// Handler that ignores the reply.
pub fn null_reply(_: &mut ClientState, _: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    Ok(())
}

/// Handler that alerts the server's error text on `err`.
pub fn default_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if let Some(msg) = reply.error() {
        state.ui.alert(msg);
    }
    Ok(())
}

/// Alerts `"{context}: {msg}"` for an `err` reply. Returns true when the
/// reply was an error.
pub(crate) fn alert_error(state: &ClientState, reply: &Reply, context: &str) -> bool {
    match reply.error() {
        Some(msg) => {
            state.ui.alert(format!("{}: {}", context, msg));
            true
        }
        None => false,
    }
}

/// Parses a numeric field of a decoded list element.
pub(crate) fn record_number(record: &IndexedRecord, key: &str) -> Result<i64, ProtocolError> {
    let raw = record.get(key).map(String::as_str).unwrap_or_default();
    raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
        header: key.to_string(),
        value: raw.to_string(),
    })
}

/// Takes a text field out of a decoded list element, empty when absent.
pub(crate) fn take_field(record: &mut IndexedRecord, key: &str) -> String {
    record.remove(key).unwrap_or_default()
}

/// Orders list entries newest first, breaking time ties by descending
/// numeric id.
pub(crate) fn newest_first(a_time: i64, a_id: &str, b_time: i64, b_id: &str) -> Ordering {
    let id = |s: &str| s.trim().parse::<i64>().unwrap_or(0);
    b_time.cmp(&a_time).then_with(|| id(b_id).cmp(&id(a_id)))
}
