//! # lib_abacus
//!
//! Client-side engines for the Abacus programming-contest system.
//!
//! Two engines carry the weight of the crate:
//!
//! - **`queue`**: serializes every request/reply interaction with the server
//!   over a single logical channel that allows one outstanding request at a
//!   time, and correlates each `ok`/`err` reply with the oldest
//!   unacknowledged entry.
//! - **`standings`**: ranks a standings snapshot with tie handling and works
//!   out which rows changed since the previous snapshot.
//!
//! Around them sit the strongly-typed `protocol` boundary, the `features`
//! (session, problems, clarifications, submissions, contest status), the
//! `client` that routes inbound messages, and the `ui` event boundary used by
//! whatever front-end renders the results.
//!
//! Networking clients are feature-gated: `transport` (WebSocket session) and
//! `feeds` (HTTP pollers).

#![forbid(unsafe_code)]

pub mod client;
pub mod features;
pub mod protocol;
pub mod queue;
pub mod standings;
pub mod ui;
pub mod utils;

#[cfg(feature = "feeds")]
pub mod feeds;
#[cfg(feature = "transport")]
pub mod transport;

// Re-export the types most callers need.
pub use client::{AbacusClient, ClientCommand, ClientSettings, ClientState};
pub use protocol::{Content, Inbound, Message, Reply};
pub use queue::{HandlerError, HandlerResult, MessageQueue, ReplyHandler, Scheduler, Transport};
pub use standings::{ColumnLayout, Snapshot, StandingsBoard, StandingsView};
pub use ui::{UiEvent, UiSink};
