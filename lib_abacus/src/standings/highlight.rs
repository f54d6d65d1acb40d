//! # Change Highlighting
//!
//! Decides which rows of a new snapshot get the transient "changed" pulse.
//!
//! The comparison is positional, not keyed: a cursor walks the previous
//! snapshot, skipping rows whose identity was already matched, and each new
//! row is compared with whatever old row the cursor rests on. Because the
//! comparison includes the identity key, an inserted or removed row shifts the
//! alignment and flags rows whose scores did not change. Front-ends rely on
//! this exact behaviour, so it is kept as is.

use std::collections::HashSet;

use super::snapshot::StandingRow;

/// Flags, per row of `new`, whether it is highlighted.
///
/// `old` is `None` for the first snapshot ever shown, in which case nothing is
/// highlighted.
pub fn changed_rows(old: Option<&[StandingRow]>, new: &[StandingRow]) -> Vec<bool> {
    let Some(old) = old else {
        return vec![false; new.len()];
    };

    let mut seen: HashSet<&str> = HashSet::with_capacity(new.len());
    let mut cursor = 0;
    new.iter()
        .map(|row| {
            while cursor < old.len() && seen.contains(old[cursor].key.as_str()) {
                cursor += 1;
            }
            let changed = cursor >= old.len() || !old[cursor].same_score(row);
            seen.insert(row.key.as_str());
            changed
        })
        .collect()
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
            problems: vec![0, 0],
            contestant: true,
            width: 5,
        }
    }

    #[test]
    fn first_snapshot_is_never_highlighted() {
        let new = vec![row("A", 5, 100), row("B", 3, 50)];
        assert_eq!(changed_rows(None, &new), vec![false, false]);
    }

    #[test]
    fn unchanged_snapshot_has_no_highlights() {
        let old = vec![row("A", 5, 100), row("B", 3, 50)];
        let new = old.clone();
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![false, false]);
    }

    #[test]
    fn score_change_is_highlighted() {
        let old = vec![row("A", 5, 100), row("B", 3, 50)];
        let new = vec![row("A", 5, 100), row("B", 4, 90)];
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![false, true]);
    }

    #[test]
    fn insertion_before_existing_row() {
        // B aligns with A and is flagged; A then aligns with itself.
        let old = vec![row("A", 5, 100)];
        let new = vec![row("B", 1, 10), row("A", 5, 100)];
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![true, false]);
    }

    #[test]
    fn removal_drifts_alignment() {
        // After A is matched the cursor rests on B, which was removed, so the
        // unchanged C is compared with B and flagged.
        let old = vec![row("A", 5, 100), row("B", 3, 50), row("C", 1, 10)];
        let new = vec![row("A", 5, 100), row("C", 1, 10)];
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![false, true]);
    }

    #[test]
    fn overtaking_row_is_flagged() {
        let old = vec![row("A", 2, 100), row("B", 2, 200)];
        let new = vec![row("B", 3, 250), row("A", 2, 100)];
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![true, false]);
    }

    #[test]
    fn rows_beyond_old_end_are_new() {
        let old = vec![row("A", 1, 10)];
        let new = vec![row("A", 1, 10), row("Z", 0, 0)];
        assert_eq!(changed_rows(Some(&old[..]), &new), vec![false, true]);
    }
}
