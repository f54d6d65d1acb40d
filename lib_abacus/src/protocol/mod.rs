//! # Protocol Module
//!
//! The strongly-typed boundary between the wire and the rest of the crate.
//! Raw messages are decoded here exactly once: into an [`Inbound`] variant,
//! into indexed-array records, or into a standings [`Grid`]. Nothing beyond
//! this module looks at `id0`/`row_1_2` style header names.
//!
//! ## Components:
//!
//! - **`message`**: the `Message` envelope, its `Content`, and the `Reply`
//!   seen by queue handlers.
//! - **`inbound`**: classification of inbound messages by name.
//! - **`indexed`**: sentinel-by-absence list decoding.
//! - **`grid`**: `nrows`/`ncols`/`row_R_C` table decoding.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Row/column table decoding.
pub mod grid;
/// Classification of inbound messages.
pub mod inbound;
/// Indexed-array list decoding.
pub mod indexed;
/// The message envelope and replies.
pub mod message;

use thiserror::Error;

pub use grid::Grid;
pub use inbound::{Inbound, StartStop};
pub use indexed::{decode_indexed, IndexedRecord};
pub use message::{Content, Headers, Message, Reply};

/// Errors raised while reading a message that lacks what the caller needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A header required to process the message was absent.
    #[error("message '{message}' is missing required header '{header}'")]
    MissingHeader {
        /// Name of the message.
        message: String,
        /// The missing header.
        header: String,
    },
    /// A header that should hold a number did not.
    #[error("header '{header}' is not a number: '{value}'")]
    InvalidNumber {
        /// The offending header.
        header: String,
        /// Its raw value.
        value: String,
    },
}
