//! # Feeds Module
//!
//! Self-scheduling HTTP pollers for data the server publishes as plain
//! resources rather than over the message channel.
//!
//! ## Pollers:
//!
//! - **`standings_feed`**: the tab-separated standings resource, ranked and
//!   rendered by the standings engine and written to a file for a
//!   standalone board.
//! - **`resources`**: the resources page shown beside the contest tabs,
//!   fetched with conditional requests.
//!
//! Both poll, handle the result and sleep. A failed poll is logged and the
//! next one proceeds on schedule.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Resources page poller.
pub mod resources;
/// Standalone standings board poller.
pub mod standings_feed;

use std::time::Duration;

use thiserror::Error;

use crate::standings::SnapshotError;

pub use resources::{ResourcesConfig, ResourcesPoller};
pub use standings_feed::{StandingsFeed, StandingsFeedConfig};

/// Errors raised by a single poll.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with an unexpected status.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The body could not be parsed.
    #[error(transparent)]
    Parse(#[from] SnapshotError),
    /// The output could not be written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the HTTP client shared by a poller's requests.
pub(crate) fn http_client(user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
        .unwrap_or_default()
}
