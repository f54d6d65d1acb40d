//! # Standings Rendering
//!
//! Produces the HTML fragments the front-ends insert into the standings table:
//! a header row and one body row per snapshot row, in snapshot order.

use std::fmt::Write as _;

use serde::Serialize;

use super::filter::SearchFilter;
use super::snapshot::{Snapshot, StandingRow};
use crate::utils::{escape_html, time_to_string};

/// CSS classes of the name columns, in display order.
const NAME_CLASSES: [&str; 2] = ["column_username", "column_friendlyname"];

/// Class added to rows that changed since the previous snapshot.
pub const HIGHLIGHT_CLASS: &str = "do_highlight";

/// Class added to rows matching the live filter.
pub const SEARCH_CLASS: &str = "search";

/// A fully rendered standings table plus the facts it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StandingsView {
    /// `<tr>` of column headings.
    pub header_html: String,
    /// One `<col />` per problem column.
    pub colgroup_html: String,
    /// `<tr>` rows of the body.
    pub body_html: String,
    /// Displayed place of each row.
    pub places: Vec<usize>,
    /// Identity keys of highlighted rows.
    pub highlighted: Vec<String>,
    /// Identity keys of rows matching the filter.
    pub matched: Vec<String>,
    /// Whether the filter text is an invalid pattern.
    pub filter_invalid: bool,
    /// How long the highlight pulse lasts.
    pub highlight_ms: u64,
}

/// Renders one per-problem result cell.
pub fn problem_cell(value: i64) -> String {
    if value > 1 {
        format!("<span class=\"correct\">+{}</span>", value - 1)
    } else if value == 1 {
        "<span class=\"correct\">+</span>".to_string()
    } else if value < 0 {
        format!("<span class=\"incorrect\">&minus;{}</span>", -value)
    } else {
        String::new()
    }
}

/// Renders the heading row.
pub fn header_html(snapshot: &Snapshot) -> String {
    let mut html = String::from("<tr><th>Place</th>");
    let labels = snapshot
        .name_labels
        .iter()
        .chain(snapshot.score_labels.iter())
        .chain(snapshot.problem_labels.iter());
    for label in labels {
        let _ = write!(html, "<th>{}</th>", escape_html(label));
    }
    html.push_str("</tr>");
    html
}

/// Renders the `<col />` group for the problem columns.
pub fn colgroup_html(snapshot: &Snapshot) -> String {
    "<col />".repeat(snapshot.problem_labels.len())
}

/// Renders one body row.
pub fn row_html(row: &StandingRow, index: usize, place: usize, highlighted: bool, matched: bool) -> String {
    let mut classes = String::from(if index % 2 == 0 { "odd" } else { "even" });
    if highlighted {
        classes.push(' ');
        classes.push_str(HIGHLIGHT_CLASS);
    }
    if matched {
        classes.push(' ');
        classes.push_str(SEARCH_CLASS);
    }

    let mut html = format!("<tr class=\"{}\">", classes);
    let _ = write!(html, "<td class=\"column_place\">{}</td>", place);
    for (name, class) in row.names.iter().zip(NAME_CLASSES.iter()) {
        let _ = write!(html, "<td class=\"{}\">{}</td>", class, escape_html(name));
    }
    let _ = write!(html, "<td class=\"column_total_solved\">{}</td>", row.solved);
    let _ = write!(
        html,
        "<td class=\"column_total_time\">{}</td>",
        escape_html(&time_to_string(row.time))
    );
    for value in &row.problems {
        let _ = write!(html, "<td class=\"column_solved\">{}</td>", problem_cell(*value));
    }
    html.push_str("</tr>");
    html
}

/// Renders every body row of `snapshot`.
pub fn body_html(snapshot: &Snapshot, places: &[usize], highlights: &[bool], filter: &SearchFilter) -> String {
    snapshot
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row_html(
                row,
                i,
                places.get(i).copied().unwrap_or(i + 1),
                highlights.get(i).copied().unwrap_or(false),
                filter.is_match(row.username()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::snapshot::ColumnLayout;

    #[test]
    fn problem_cells() {
        assert_eq!(problem_cell(0), "");
        assert_eq!(problem_cell(1), "<span class=\"correct\">+</span>");
        assert_eq!(problem_cell(3), "<span class=\"correct\">+2</span>");
        assert_eq!(problem_cell(-2), "<span class=\"incorrect\">&minus;2</span>");
    }

    #[test]
    fn renders_escaped_rows_with_parity() {
        let text = "id\tu\tn\tg\tc\ts\tt\tA\n\
            1\t<al>\tAl & Co\tg\t1\t1\t3661\t2\n\
            2\tbob\tBob\tg\t1\t0\t-5\t0\n";
        let snap = Snapshot::parse_tsv(text, ColumnLayout::Tagged, false).unwrap();
        let mut filter = SearchFilter::new();
        filter.set("bob");

        let html = body_html(&snap, &[1, 2], &[true, false], &filter);
        assert!(html.starts_with("<tr class=\"odd do_highlight\"><td class=\"column_place\">1</td>"));
        assert!(html.contains("<td class=\"column_username\">&lt;al&gt;</td>"));
        assert!(html.contains("<td class=\"column_friendlyname\">Al &amp; Co</td>"));
        assert!(html.contains("<td class=\"column_total_time\">01:01:01</td>"));
        assert!(html.contains("<tr class=\"even search\">"));
        assert!(html.contains("<td class=\"column_total_time\">-00:00:05</td>"));
    }

    #[test]
    fn header_lists_every_column() {
        let text = "Contestant\tA\tB\tSolved\tTotal time\n";
        let snap = Snapshot::parse_tsv(text, ColumnLayout::Positional, false).unwrap();
        assert_eq!(
            header_html(&snap),
            "<tr><th>Place</th><th>Contestant</th><th>Solved</th><th>Total time</th><th>A</th><th>B</th></tr>"
        );
        assert_eq!(colgroup_html(&snap), "<col /><col />");
    }
}
