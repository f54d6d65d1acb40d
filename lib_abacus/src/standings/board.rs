//! # Standings Board
//!
//! Owns the last snapshot and the live filter, and runs the
//! rank, diff and render cycle for every update.

use std::time::Duration;

use super::filter::SearchFilter;
use super::highlight::changed_rows;
use super::ranking::tie_places;
use super::render::{body_html, colgroup_html, header_html, StandingsView};
use super::snapshot::Snapshot;

/// How long a highlighted row pulses.
pub const HIGHLIGHT_PULSE: Duration = Duration::from_millis(3000);

/// Stateful standings table.
#[derive(Debug, Default)]
pub struct StandingsBoard {
    current: Option<Snapshot>,
    filter: SearchFilter,
}

impl StandingsBoard {
    /// Creates a board that has never shown a snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-renders the table.
    ///
    /// `Some` replaces the stored snapshot and highlights the rows that
    /// changed against the previous one; the first snapshot ever stored gets
    /// no highlights. `None` re-renders the stored snapshot with the current
    /// filter and highlights nothing.
    pub fn update_standings(&mut self, snapshot: Option<Snapshot>) -> StandingsView {
        let highlights = match snapshot {
            Some(new) => {
                let previous = self.current.take();
                let flags = changed_rows(previous.as_ref().map(|s| s.rows.as_slice()), &new.rows);
                self.current = Some(new);
                flags
            }
            None => Vec::new(),
        };

        let Some(current) = self.current.as_ref() else {
            return StandingsView {
                filter_invalid: self.filter.is_invalid(),
                highlight_ms: HIGHLIGHT_PULSE.as_millis() as u64,
                ..Default::default()
            };
        };

        let places = tie_places(&current.rows);
        let highlighted = current
            .rows
            .iter()
            .zip(highlights.iter())
            .filter(|(_, h)| **h)
            .map(|(r, _)| r.key.clone())
            .collect::<Vec<_>>();
        let matched = current
            .rows
            .iter()
            .filter(|r| self.filter.is_match(r.username()))
            .map(|r| r.key.clone())
            .collect();

        if !highlighted.is_empty() {
            log::debug!("Standings update highlights {} row(s)", highlighted.len());
        }

        StandingsView {
            header_html: header_html(current),
            colgroup_html: colgroup_html(current),
            body_html: body_html(current, &places, &highlights, &self.filter),
            places,
            highlighted,
            matched,
            filter_invalid: self.filter.is_invalid(),
            highlight_ms: HIGHLIGHT_PULSE.as_millis() as u64,
        }
    }

    /// Changes the filter text and re-renders without highlighting.
    pub fn set_filter(&mut self, text: &str) -> StandingsView {
        self.filter.set(text);
        self.update_standings(None)
    }

    /// The snapshot currently shown.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// The live filter.
    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::ColumnLayout;

    fn snap(rows: &[(&str, i64, i64)]) -> Snapshot {
        let mut text = String::from("Contestant\tA\tSolved\tTotal time\n");
        for (name, solved, time) in rows {
            text.push_str(&format!("{}\t0\t{}\t{}\n", name, solved, time));
        }
        Snapshot::parse_tsv(&text, ColumnLayout::Positional, false).unwrap()
    }

    #[test]
    fn first_update_has_no_highlights() {
        let mut board = StandingsBoard::new();
        let view = board.update_standings(Some(snap(&[("A", 5, 100), ("B", 5, 100), ("C", 3, 50)])));
        assert!(view.highlighted.is_empty());
        assert_eq!(view.places, vec![1, 1, 3]);
        assert!(!view.body_html.contains("do_highlight"));
    }

    #[test]
    fn second_update_highlights_inserted_row() {
        let mut board = StandingsBoard::new();
        board.update_standings(Some(snap(&[("A", 5, 100)])));
        let view = board.update_standings(Some(snap(&[("B", 1, 10), ("A", 5, 100)])));
        assert_eq!(view.highlighted, vec!["B".to_string()]);
    }

    #[test]
    fn identical_update_highlights_nothing() {
        let mut board = StandingsBoard::new();
        let rows = [("A", 5, 100), ("B", 3, 50)];
        board.update_standings(Some(snap(&rows)));
        let view = board.update_standings(Some(snap(&rows)));
        assert!(view.highlighted.is_empty());
    }

    #[test]
    fn filter_change_rerenders_without_highlights() {
        let mut board = StandingsBoard::new();
        board.update_standings(Some(snap(&[("alice", 1, 10)])));
        board.update_standings(Some(snap(&[("alice", 2, 20)])));

        let view = board.set_filter("ALI");
        assert!(view.highlighted.is_empty());
        assert_eq!(view.matched, vec!["alice".to_string()]);
        assert!(view.body_html.contains("search"));

        let view = board.set_filter("(");
        assert!(view.filter_invalid);
        assert_eq!(view.matched, vec!["alice".to_string()]);
    }

    #[test]
    fn filter_before_any_snapshot() {
        let mut board = StandingsBoard::new();
        let view = board.set_filter("x");
        assert!(view.body_html.is_empty());
        assert!(board.snapshot().is_none());
        assert_eq!(board.filter().text(), "x");
    }
}
