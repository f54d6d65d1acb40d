//! Tie-aware places.
//!
//! Rows arrive already ordered by the source (most solved first, then least
//! time). Nothing is re-sorted here; a row starts a new place at its 1-based
//! position unless its score equals the previous row's, in which case it
//! shares that row's place.

use super::snapshot::StandingRow;

/// Computes the displayed place of every row, in input order.
pub fn tie_places(rows: &[StandingRow]) -> Vec<usize> {
    let mut places = Vec::with_capacity(rows.len());
    let mut last: Option<(i64, i64)> = None;
    let mut place = 1;
    for (i, row) in rows.iter().enumerate() {
        if last != Some(row.score()) {
            place = i + 1;
        }
        last = Some(row.score());
        places.push(place);
    }
    places
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, solved: i64, time: i64) -> StandingRow {
        StandingRow {
            key: key.to_string(),
            names: vec![key.to_string()],
            group: None,
            solved,
            time,
            problems: vec![],
            contestant: true,
            width: 3,
        }
    }

    #[test]
    fn equal_scores_share_a_place() {
        let rows = vec![row("a", 5, 100), row("b", 5, 100), row("c", 3, 50)];
        assert_eq!(tie_places(&rows), vec![1, 1, 3]);
    }

    #[test]
    fn ties_only_with_the_previous_row() {
        // Same score separated by a different one starts a fresh place.
        let rows = vec![
            row("a", 2, 10),
            row("b", 1, 10),
            row("c", 2, 10),
            row("d", 2, 10),
        ];
        assert_eq!(tie_places(&rows), vec![1, 2, 3, 3]);
    }

    #[test]
    fn empty_input() {
        assert!(tie_places(&[]).is_empty());
    }
}
