//! # Standings Module
//!
//! Turns a raw standings snapshot into a ranked, rendered table and works out
//! which rows changed since the previous snapshot.
//!
//! ## Components:
//!
//! - **`snapshot`**: rows and labels, parsed from the message-channel grid or
//!   from the tab-separated feed in either column layout.
//! - **`ranking`**: tie places over rows in source order.
//! - **`highlight`**: order-based alignment of consecutive snapshots.
//! - **`filter`**: the live, case-insensitive username filter.
//! - **`render`**: HTML fragments for the header and body.
//! - **`board`**: the stateful `update_standings` entry point.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The stateful table.
pub mod board;
/// Live username filter.
pub mod filter;
/// Changed-row detection.
pub mod highlight;
/// Tie places.
pub mod ranking;
/// HTML rendering.
pub mod render;
/// Snapshot parsing.
pub mod snapshot;

pub use board::{StandingsBoard, HIGHLIGHT_PULSE};
pub use filter::{debug_command, SearchFilter};
pub use highlight::changed_rows;
pub use ranking::tie_places;
pub use render::StandingsView;
pub use snapshot::{ColumnLayout, Snapshot, SnapshotError, StandingRow};
