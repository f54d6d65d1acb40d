//! # Message Queue Module
//!
//! Serializes every request/reply interaction with the Abacus server over a
//! channel that allows one outstanding request at a time.
//!
//! ## Core Behaviour:
//!
//! 1.  **One in flight**: the pump does nothing while a reply is pending. The
//!     next entry leaves the queue only after the current one resolved.
//!
//! 2.  **Local entries**: a handler-only entry never touches the network. When
//!     it reaches the head, an `ok` reply carrying its data is synthesized, so
//!     client-side continuations stay ordered behind earlier round-trips.
//!
//! 3.  **Fault isolation**: a handler returning an error is logged and
//!     surfaced as an alert; the queue keeps draining.
//!
//! 4.  **Hard reset**: `reset` abandons the in-flight request and everything
//!     queued behind it. There is no retry.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Outbound transport seam.
pub mod channel;
/// The queue state machine.
pub mod engine;

use thiserror::Error;

use crate::protocol::ProtocolError;
use crate::standings::SnapshotError;

pub use channel::{ChannelTransport, Transport, TransportError};
pub use engine::{MessageQueue, ReplyHandler, Scheduler, SEND_FAILURE};

/// Failure of a reply handler.
///
/// Application-level `err` replies are not handler failures; handlers deal
/// with them directly. These are the faults that would otherwise abort
/// processing of a reply.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The reply lacked or mangled something the handler needed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Standings data could not be turned into a snapshot.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The handler was invoked in a state where it cannot proceed.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

/// Outcome of one handler invocation.
pub type HandlerResult = Result<(), HandlerError>;
