//! # Transport Module
//!
//! Carries the Abacus message channel over a Bayeux-style publish/subscribe
//! session on a WebSocket.
//!
//! ## Channels:
//!
//! - **`/meta/handshake`**: session start. A successful handshake starts a
//!   fresh client session (queue reset, automatic login).
//! - **`/meta/connect`**, **`/meta/disconnect`**: connection flag.
//! - **`/service/abacus`**: requests out, replies and pushes in.
//! - **`/service/log`**: server log lines for the message log.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Frame format and channel names.
pub mod bus;
/// The reconnecting session loop.
pub mod session;

pub use bus::BusFrame;
pub use session::{run, SessionConfig};
