//! # Grid Decoding
//!
//! The `standings` reply and the `updatestandings` push carry a table as
//! headers: `nrows`, `ncols` and one `row_R_C` header per cell. Row 0 holds
//! the column labels. The server leaves out problem cells a contestant never
//! attempted, so an absent data cell reads as `0`.
//!
//! The label row and the first column are always sent, so the last label
//! cell and the first cell of the last row must be present. Dimensions that
//! point past them are rejected before anything is allocated.

use super::message::Headers;
use super::ProtocolError;

/// A decoded table: column labels plus data rows, all as strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    /// Labels from row 0.
    pub header: Vec<String>,
    /// Data rows, each exactly `header.len()` cells wide.
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Decodes a grid from message headers.
    pub fn decode(headers: &Headers) -> Result<Self, ProtocolError> {
        let nrows = dimension(headers, "nrows")?;
        let ncols = dimension(headers, "ncols")?;

        let cell = |r: usize, c: usize| headers.get(&format!("row_{}_{}", r, c));

        if ncols > 0 && cell(0, ncols - 1).is_none() {
            return Err(out_of_range(headers, "ncols"));
        }
        if nrows > 1 && (ncols == 0 || cell(nrows - 1, 0).is_none()) {
            return Err(out_of_range(headers, "nrows"));
        }

        let header = (0..ncols)
            .map(|c| cell(0, c).cloned().unwrap_or_default())
            .collect();
        let rows = (1..nrows)
            .map(|r| {
                (0..ncols)
                    .map(|c| cell(r, c).cloned().unwrap_or_else(|| "0".to_string()))
                    .collect()
            })
            .collect();

        Ok(Self { header, rows })
    }
}

fn dimension(headers: &Headers, key: &str) -> Result<usize, ProtocolError> {
    let raw = headers.get(key).ok_or_else(|| ProtocolError::MissingHeader {
        message: "standings".to_string(),
        header: key.to_string(),
    })?;
    raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
        header: key.to_string(),
        value: raw.clone(),
    })
}

fn out_of_range(headers: &Headers, key: &str) -> ProtocolError {
    ProtocolError::InvalidNumber {
        header: key.to_string(),
        value: headers.get(key).cloned().unwrap_or_default(),
    }
}
