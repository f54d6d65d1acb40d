//! # Standings Snapshot
//!
//! One full standings table as received at a point in time. Two column
//! layouts exist in the wild and both map onto the same [`StandingRow`]:
//!
//! - **Positional**: the grid sent by the server on the message channel. The
//!   first column is the contestant, the last two are solved count and total
//!   time, and every column in between is a problem.
//! - **Tagged**: the tab-separated `standings.txt` published for the
//!   standalone board, where each leading column has a fixed role
//!   (id, username, friendly name, group, contestant flag, solved, time) and
//!   problems follow.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Grid;

const TAGGED_ID: usize = 0;
const TAGGED_USERNAME: usize = 1;
const TAGGED_FRIENDLYNAME: usize = 2;
const TAGGED_GROUP: usize = 3;
const TAGGED_CONTESTANT: usize = 4;
const TAGGED_TOTAL_SOLVED: usize = 5;
const TAGGED_TOTAL_TIME: usize = 6;
const TAGGED_FIRST_PROBLEM: usize = 7;

/// Errors raised while building a snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The feed had no header line.
    #[error("standings feed is empty")]
    Empty,
    /// A data row has fewer columns than its layout requires.
    #[error("row {row} has {found} columns, expected at least {expected}")]
    ShortRow {
        /// 1-based data row number.
        row: usize,
        /// Columns found.
        found: usize,
        /// Columns required.
        expected: usize,
    },
    /// A numeric column did not parse.
    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    BadNumber {
        /// 1-based data row number.
        row: usize,
        /// Role of the column.
        column: &'static str,
        /// Raw value.
        value: String,
    },
}

/// How raw columns map to row roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Contestant first, solved and time last, problems between.
    Positional,
    /// Fixed role columns, problems from the eighth column on.
    Tagged,
}

impl FromStr for ColumnLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(ColumnLayout::Positional),
            "tagged" => Ok(ColumnLayout::Tagged),
            other => Err(format!("unknown standings layout '{}'", other)),
        }
    }
}

/// One contestant's line in the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingRow {
    /// Identity key used to align rows across snapshots.
    pub key: String,
    /// Display columns in order (username, then friendly name if any).
    pub names: Vec<String>,
    /// Group the user belongs to, when the layout carries one.
    pub group: Option<String>,
    /// Problems solved.
    pub solved: i64,
    /// Total penalty time in seconds.
    pub time: i64,
    /// Per-problem result: `0` untried, `n > 0` solved on try `n`,
    /// `n < 0` `-n` failed tries.
    pub problems: Vec<i64>,
    /// Whether the user is a contestant (always true for positional rows).
    pub contestant: bool,
    /// Number of raw columns the row was built from.
    pub width: usize,
}

impl StandingRow {
    /// The name the live filter matches against.
    pub fn username(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// The rank-relevant tuple.
    pub fn score(&self) -> (i64, i64) {
        (self.solved, self.time)
    }

    /// True when both rows have the same identity, width and score.
    pub fn same_score(&self, other: &StandingRow) -> bool {
        self.width == other.width && self.key == other.key && self.score() == other.score()
    }
}

/// # Snapshot
///
/// Column labels plus rows in the order the source ranked them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Labels of the name columns.
    pub name_labels: Vec<String>,
    /// Labels of the solved and time columns.
    pub score_labels: [String; 2],
    /// Problem labels.
    pub problem_labels: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<StandingRow>,
}

impl Snapshot {
    /// Builds a positional snapshot from a decoded grid.
    pub fn from_grid(grid: &Grid) -> Result<Self, SnapshotError> {
        let ncols = grid.header.len();
        if ncols < 3 {
            return Err(SnapshotError::Empty);
        }
        let label = |c: usize| grid.header.get(c).cloned().unwrap_or_default();

        let rows = grid
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| positional_row(i + 1, cells))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name_labels: vec![label(0)],
            score_labels: [label(ncols - 2), label(ncols - 1)],
            problem_labels: grid.header[1..ncols - 2].to_vec(),
            rows,
        })
    }

    /// Parses a tab-separated feed.
    ///
    /// The first non-blank line is the header. Blank lines are skipped and a
    /// trailing carriage return is dropped from every line. With
    /// `contestants_only`, tagged rows whose contestant flag is zero are left
    /// out.
    pub fn parse_tsv(
        text: &str,
        layout: ColumnLayout,
        contestants_only: bool,
    ) -> Result<Self, SnapshotError> {
        let mut lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .filter(|l| !l.is_empty())
            .map(|l| l.split('\t').map(str::to_string).collect::<Vec<String>>());

        let header = lines.next().ok_or(SnapshotError::Empty)?;
        match layout {
            ColumnLayout::Positional => {
                let grid = Grid {
                    header,
                    rows: lines.collect(),
                };
                Self::from_grid(&grid)
            }
            ColumnLayout::Tagged => {
                let mut rows = Vec::new();
                for (i, cells) in lines.enumerate() {
                    let row = tagged_row(i + 1, &cells)?;
                    if contestants_only && !row.contestant {
                        continue;
                    }
                    rows.push(row);
                }
                let problem_labels = header.get(TAGGED_FIRST_PROBLEM..).unwrap_or(&[]).to_vec();
                Ok(Self {
                    name_labels: vec!["Team".to_string(), "Name".to_string()],
                    score_labels: ["Points".to_string(), "Time".to_string()],
                    problem_labels,
                    rows,
                })
            }
        }
    }
}

fn number(row: usize, column: &'static str, raw: &str) -> Result<i64, SnapshotError> {
    raw.trim().parse().map_err(|_| SnapshotError::BadNumber {
        row,
        column,
        value: raw.to_string(),
    })
}

fn problems(row: usize, cells: &[String]) -> Result<Vec<i64>, SnapshotError> {
    cells.iter().map(|c| number(row, "problem", c)).collect()
}

fn positional_row(row: usize, cells: &[String]) -> Result<StandingRow, SnapshotError> {
    let n = cells.len();
    if n < 3 {
        return Err(SnapshotError::ShortRow {
            row,
            found: n,
            expected: 3,
        });
    }
    Ok(StandingRow {
        key: cells[0].clone(),
        names: vec![cells[0].clone()],
        group: None,
        solved: number(row, "solved", &cells[n - 2])?,
        time: number(row, "time", &cells[n - 1])?,
        problems: problems(row, &cells[1..n - 2])?,
        contestant: true,
        width: n,
    })
}

fn tagged_row(row: usize, cells: &[String]) -> Result<StandingRow, SnapshotError> {
    if cells.len() < TAGGED_FIRST_PROBLEM {
        return Err(SnapshotError::ShortRow {
            row,
            found: cells.len(),
            expected: TAGGED_FIRST_PROBLEM,
        });
    }
    let contestant = number(row, "contestant", &cells[TAGGED_CONTESTANT])? != 0;
    Ok(StandingRow {
        key: cells[TAGGED_ID].clone(),
        names: vec![
            cells[TAGGED_USERNAME].clone(),
            cells[TAGGED_FRIENDLYNAME].clone(),
        ],
        group: Some(cells[TAGGED_GROUP].clone()),
        solved: number(row, "solved", &cells[TAGGED_TOTAL_SOLVED])?,
        time: number(row, "time", &cells[TAGGED_TOTAL_TIME])?,
        problems: problems(row, &cells[TAGGED_FIRST_PROBLEM..])?,
        contestant,
        width: cells.len(),
    })
}
