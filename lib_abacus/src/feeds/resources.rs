//! Resources page poller.
//!
//! The page rarely changes, so every poll after the first is conditional on
//! the `Last-Modified` time of the previous answer.

use std::time::Duration;

use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use tokio::sync::broadcast;

use super::{http_client, FeedError};
use crate::ui::{UiEvent, UiSink};

/// Settings of the resources poller.
#[derive(Debug, Clone)]
pub struct ResourcesConfig {
    /// URL of the resources page.
    pub url: String,
    /// Time between polls.
    pub interval: Duration,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/resources.html".to_string(),
            interval: Duration::from_secs(15),
        }
    }
}

/// Delivers changed resources pages as [`UiEvent::ResourcesUpdated`].
pub struct ResourcesPoller {
    config: ResourcesConfig,
    client: reqwest::Client,
    last_modified: Option<String>,
    ui: UiSink,
}

impl ResourcesPoller {
    /// Creates a poller that has not fetched anything yet.
    pub fn new(config: ResourcesConfig, ui: UiSink) -> Self {
        Self {
            config,
            client: http_client("AbacusClient/1.0"),
            last_modified: None,
            ui,
        }
    }

    /// Polls until shutdown.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            if let Err(e) = self.poll_once().await {
                log::warn!("Resources poll failed: {}", e);
            }
            tokio::select! {
                _ = shutdown.recv() => return,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// Fetches the page once. Returns whether a new body was delivered.
    pub async fn poll_once(&mut self) -> Result<bool, FeedError> {
        let mut request = self.client.get(&self.config.url);
        if let Some(since) = &self.last_modified {
            request = request.header(IF_MODIFIED_SINCE, since.as_str());
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            log::trace!("Resources unchanged");
            return Ok(false);
        }
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        if let Some(modified) = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
        {
            self.last_modified = Some(modified.to_string());
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(false);
        }
        self.ui.send(UiEvent::ResourcesUpdated(body));
        Ok(true)
    }
}
