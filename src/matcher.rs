//! ANSI-aware substring matching against raw terminal output.
//!
//! Output is normalized before searching: escape sequences (CSI, OSC, DCS and
//! plain ESC sequences) are removed, then CRLF becomes LF. Tabs, carriage
//! returns and other C0 controls are kept. The raw buffer is never modified.

use vte::{Parser, Perform};

#[derive(Default)]
struct PlainText {
    text: String,
}

impl Perform for PlainText {
    fn print(&mut self, c: char) {
        self.text.push(c);
    }

    fn execute(&mut self, byte: u8) {
        self.text.push(char::from(byte));
    }
}

/// Normalize raw terminal output into plain text.
pub fn normalize(raw: &str) -> String {
    let mut plain = PlainText::default();
    Parser::new().advance(&mut plain, raw.as_bytes());
    plain.text.replace("\r\n", "\n")
}

/// Check whether `expected` appears in the normalized form of `raw`.
pub fn contains(raw: &str, expected: &str) -> bool {
    normalize(raw).contains(expected)
}

/// Length of the shortest prefix of `raw` whose normalized form contains
/// `expected`, or `None` if there is no match.
///
/// The returned offset always falls on a char boundary.
pub fn match_end(raw: &str, expected: &str) -> Option<usize> {
    if !contains(raw, expected) {
        return None;
    }
    if expected.is_empty() {
        return Some(0);
    }

    // Containment only grows as the prefix grows.
    let boundaries: Vec<usize> = raw
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(raw.len()))
        .collect();
    let first = boundaries.partition_point(|&end| !contains(&raw[..end], expected));
    boundaries.get(first).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_codes_ignored() {
        assert!(contains("\x1b[32mOK\x1b[0m", "OK"));
    }

    #[test]
    fn test_crlf_normalized() {
        assert!(contains("line one\r\nline two\r\n", "line one\nline two\n"));
    }

    #[test]
    fn test_missing_text() {
        assert!(!contains("\x1b[1mready\x1b[0m", "steady"));
    }

    #[test]
    fn test_styled_prompt() {
        let raw = "? Where do you use GitHub?  [Use arrows to move, type to filter]\x1b[0m\r\n\
                   \x1b[0;1;36m> GitHub.com\x1b[0m\r\n\x1b[0;39m  Other\x1b[0m\r\n";
        assert!(contains(raw, "> GitHub.com\n  Other\n"));
    }

    #[test]
    fn test_repeated_checks_are_stable() {
        let raw = String::from("\x1b[31merror\x1b[0m: nope\r\n");
        let before = raw.clone();
        for _ in 0..3 {
            assert!(contains(&raw, "error: nope\n"));
        }
        assert_eq!(raw, before);
    }

    #[test]
    fn test_match_end_stops_after_match() {
        let raw = "first\r\nsecond\r\nthird";
        let end = match_end(raw, "second").unwrap();
        assert_eq!(&raw[..end], "first\r\nsecond");
    }

    #[test]
    fn test_match_end_spans_escape_codes() {
        let raw = "\x1b[32mOK\x1b[0m and more";
        let end = match_end(raw, "OK").unwrap();
        assert!(contains(&raw[..end], "OK"));
        assert!(!contains(&raw[..end - 1], "OK"));
    }

    #[test]
    fn test_match_end_multibyte() {
        let raw = "✓ done ✓";
        let end = match_end(raw, "done").unwrap();
        assert_eq!(&raw[..end], "✓ done");
    }

    #[test]
    fn test_tabs_survive() {
        assert_eq!(normalize("a\tb"), "a\tb");
        assert!(contains("NAME\tSTATUS\r\n", "NAME\tSTATUS\n"));
        assert!(contains("\x1b[1mNAME\x1b[0m\tSTATUS", "NAME\tSTATUS"));
    }

    #[test]
    fn test_lone_carriage_return_kept() {
        assert_eq!(normalize("a\rb"), "a\rb");
        assert!(!contains("50%\r100%", "50%100%"));
    }

    #[test]
    fn test_osc_title_removed() {
        assert_eq!(normalize("\x1b]0;gh auth\x07> ready"), "> ready");
    }

    #[test]
    fn test_crlf_split_by_escape() {
        assert_eq!(normalize("done\r\x1b[K\n"), "done\n");
    }

    #[test]
    fn test_match_end_none() {
        assert_eq!(match_end("abc", "xyz"), None);
    }
}
