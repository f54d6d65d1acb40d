//! # Text Helpers
//!
//! Free-text fields (clarification questions and answers) travel inside
//! message headers, where a raw newline is not allowed. The byte `0x01`
//! stands in for an embedded newline while in transit.

/// The character reserved for an embedded newline in header values.
pub const NEWLINE_CODE: char = '\u{1}';

/// Longest prefix kept by [`short_text`].
const SHORT_TEXT_MAX: usize = 40;

/// Escapes `&`, `<` and `>` for insertion into rendered HTML.
///
/// Ampersands are replaced first, so the result of a single pass never
/// contains a double-escaped entity.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces every newline with [`NEWLINE_CODE`] before transmission.
pub fn encode_newlines(s: &str) -> String {
    s.chars().map(|c| if c == '\n' { NEWLINE_CODE } else { c }).collect()
}

/// Turns [`NEWLINE_CODE`] back into a line break.
///
/// Inside a preformatted context (`pre == true`) the break is a literal
/// `\n`; in flowing HTML it is `<br />`.
pub fn decode_newlines(s: &str, pre: bool) -> String {
    let replacement = if pre { "\n" } else { "<br />" };
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == NEWLINE_CODE {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}

/// Shortened form of a free-text field for table cells.
///
/// Keeps everything up to the first encoded newline or the first 40
/// characters, whichever comes first, and appends ` ...` when anything was
/// cut off.
pub fn short_text(s: &str) -> String {
    let mut out = String::new();
    let mut continued = false;
    for (i, c) in s.chars().enumerate() {
        if c == NEWLINE_CODE || i == SHORT_TEXT_MAX {
            continued = true;
            break;
        }
        out.push(c);
    }
    if continued {
        out.push_str(" ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_once() {
        assert_eq!(escape_html("<a&b>"), "&lt;a&amp;b&gt;");
        assert_eq!(escape_html("plain"), "plain");
        // A second pass escapes the entities again; callers escape exactly once.
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn newline_codec() {
        let encoded = encode_newlines("line one\nline two");
        assert_eq!(encoded, "line one\u{1}line two");
        assert_eq!(decode_newlines(&encoded, true), "line one\nline two");
        assert_eq!(decode_newlines(&encoded, false), "line one<br />line two");
    }

    #[test]
    fn short_text_cuts_at_newline_or_forty_chars() {
        assert_eq!(short_text("short"), "short");
        assert_eq!(short_text("first\u{1}second"), "first ...");

        let exactly_forty = "x".repeat(40);
        assert_eq!(short_text(&exactly_forty), exactly_forty);

        let long = "y".repeat(41);
        assert_eq!(short_text(&long), format!("{} ...", "y".repeat(40)));
    }
}
