//! # Utilities Module
//!
//! Formatting helpers shared by every table the client renders: HTML
//! escaping, clock formatting and the newline convention used for free text
//! carried in message headers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// HTML escaping and free-text helpers.
pub mod text;
/// Duration and wall-clock formatting.
pub mod time;

pub use text::{decode_newlines, encode_newlines, escape_html, short_text, NEWLINE_CODE};
pub use time::{epoch_time_to_string, pad_number, time_to_string};
