//! Live search filter over the username column.

use regex::{Regex, RegexBuilder};

/// Case-insensitive pattern marking matching rows.
///
/// An invalid pattern keeps the last valid one in force and raises the
/// `invalid` flag until a valid or empty pattern is entered.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    text: String,
    regex: Option<Regex>,
    invalid: bool,
}

impl SearchFilter {
    /// Creates an empty filter that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the filter text.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        if text.is_empty() {
            self.regex = None;
            self.invalid = false;
            return;
        }
        match RegexBuilder::new(text).case_insensitive(true).build() {
            Ok(re) => {
                self.regex = Some(re);
                self.invalid = false;
            }
            Err(e) => {
                log::debug!("Invalid standings filter '{}': {}", text, e);
                self.invalid = true;
            }
        }
    }

    /// True when the pattern in force matches `username`.
    pub fn is_match(&self, username: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(username))
    }

    /// True when the last entered text failed to compile.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// The last entered text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Recognises the debug panel toggles typed into the filter box.
pub fn debug_command(text: &str) -> Option<bool> {
    match text {
        "debug show" => Some(true),
        "debug hide" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively_anywhere() {
        let mut f = SearchFilter::new();
        f.set("ALI");
        assert!(f.is_match("alice"));
        assert!(f.is_match("Natalie"));
        assert!(!f.is_match("bob"));
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let mut f = SearchFilter::new();
        assert!(!f.is_match("alice"));
        f.set("a");
        f.set("");
        assert!(!f.is_match("alice"));
        assert!(!f.is_invalid());
    }

    #[test]
    fn invalid_pattern_keeps_previous() {
        let mut f = SearchFilter::new();
        f.set("bo");
        f.set("bo(");
        assert!(f.is_invalid());
        assert!(f.is_match("bob"));
        assert_eq!(f.text(), "bo(");

        f.set("al");
        assert!(!f.is_invalid());
        assert!(!f.is_match("bob"));
    }

    #[test]
    fn debug_toggles() {
        assert_eq!(debug_command("debug show"), Some(true));
        assert_eq!(debug_command("debug hide"), Some(false));
        assert_eq!(debug_command("debug"), None);
    }
}
