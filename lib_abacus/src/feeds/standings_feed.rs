//! # Standings Feed
//!
//! Polls the tab-separated standings resource, runs it through the
//! [`StandingsBoard`] and writes the rendered table to a file that a
//! standalone board page includes. The file is replaced atomically so a
//! reader never sees half a table.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tempfile::NamedTempFile;
use tokio::sync::broadcast;

use super::{http_client, FeedError};
use crate::standings::{ColumnLayout, Snapshot, StandingsBoard, StandingsView};

/// Settings of the standings poller.
#[derive(Debug, Clone)]
pub struct StandingsFeedConfig {
    /// URL of the tab-separated standings.
    pub url: String,
    /// Column layout of the feed.
    pub layout: ColumnLayout,
    /// Leave out non-contestants (tagged layout only).
    pub contestants_only: bool,
    /// Time between polls.
    pub interval: Duration,
    /// File the rendered table is written to.
    pub output: PathBuf,
}

impl Default for StandingsFeedConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/standings.txt".to_string(),
            layout: ColumnLayout::Tagged,
            contestants_only: true,
            interval: Duration::from_secs(5),
            output: PathBuf::from("standings.html"),
        }
    }
}

/// The standalone standings poller.
pub struct StandingsFeed {
    config: StandingsFeedConfig,
    client: reqwest::Client,
    board: StandingsBoard,
}

impl StandingsFeed {
    /// Creates a poller that has not fetched anything yet.
    pub fn new(config: StandingsFeedConfig) -> Self {
        Self {
            config,
            client: http_client("AbacusStandings/1.0"),
            board: StandingsBoard::new(),
        }
    }

    /// The board holding the last accepted snapshot.
    pub fn board(&self) -> &StandingsBoard {
        &self.board
    }

    /// Polls until shutdown.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        log::info!(
            "Standings feed polling {} every {}s",
            self.config.url,
            self.config.interval.as_secs()
        );
        loop {
            match self.poll_once().await {
                Ok(view) => log::debug!(
                    "Standings written: {} row(s), {} highlighted",
                    view.places.len(),
                    view.highlighted.len()
                ),
                Err(e) => log::error!("Standings poll failed: {}", e),
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    log::info!("Standings feed shutting down...");
                    return;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// Fetches, renders and writes one snapshot.
    pub async fn poll_once(&mut self) -> Result<StandingsView, FeedError> {
        let response = self
            .client
            .get(&self.config.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let text = response.text().await?;
        self.ingest(&text)
    }

    /// Renders a feed body and writes it out.
    ///
    /// A body that fails to parse leaves both the board and the output file
    /// as they were.
    pub fn ingest(&mut self, text: &str) -> Result<StandingsView, FeedError> {
        let snapshot = Snapshot::parse_tsv(text, self.config.layout, self.config.contestants_only)?;
        let view = self.board.update_standings(Some(snapshot));
        write_atomic(&self.config.output, &render_fragment(&view))?;
        Ok(view)
    }
}

/// Wraps a view into the table fragment the board page includes.
pub fn render_fragment(view: &StandingsView) -> String {
    format!(
        "<table class=\"standings\">\n<colgroup>{}</colgroup>\n<thead>{}</thead>\n<tbody>{}</tbody>\n</table>\n",
        view.colgroup_html, view.header_html, view.body_html
    )
}

/// Replaces `path` with `contents` through a temporary file in the same
/// directory.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id\tusername\tfriendlyname\tgroup\tcontestant\tsolved\ttime\tA\n";

    fn feed(dir: &Path) -> StandingsFeed {
        StandingsFeed::new(StandingsFeedConfig {
            output: dir.join("standings.html"),
            ..Default::default()
        })
    }

    #[test]
    fn writes_rendered_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut feed = feed(dir.path());
        let text = format!("{}1\talice\tAlice A\tg\t1\t1\t20\t1\r\n2\tjudge\tJudge\tg\t0\t0\t0\t0\n", HEADER);
        let view = feed.ingest(&text).unwrap();
        assert_eq!(view.places, vec![1]);

        let html = std::fs::read_to_string(dir.path().join("standings.html")).unwrap();
        assert!(html.starts_with("<table class=\"standings\">"));
        assert!(html.contains("alice"));
        assert!(!html.contains("judge"));
    }

    #[test]
    fn bad_body_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut feed = feed(dir.path());
        feed.ingest(&format!("{}1\talice\tAlice\tg\t1\t1\t20\t1\n", HEADER)).unwrap();
        let before = std::fs::read_to_string(dir.path().join("standings.html")).unwrap();

        let err = feed.ingest(&format!("{}1\talice\tAlice\tg\t1\tmany\t20\t1\n", HEADER));
        assert!(matches!(err, Err(FeedError::Parse(_))));
        let after = std::fs::read_to_string(dir.path().join("standings.html")).unwrap();
        assert_eq!(before, after);
        assert_eq!(feed.board().snapshot().unwrap().rows[0].solved, 1);
    }

    #[test]
    fn second_poll_highlights_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut feed = feed(dir.path());
        feed.ingest(&format!("{}1\talice\tAlice\tg\t1\t0\t0\t0\n", HEADER)).unwrap();
        let view = feed
            .ingest(&format!("{}1\talice\tAlice\tg\t1\t1\t20\t1\n", HEADER))
            .unwrap();
        assert_eq!(view.highlighted, vec!["1".to_string()]);
    }
}
