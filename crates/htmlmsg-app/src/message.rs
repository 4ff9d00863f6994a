//! Failure message sanitizing
//!
//! RSpec appends its own unified diff to many failure messages. Since the
//! rendered output carries a side-by-side diff, that appendix is removed
//! unless the caller asks to keep it.

use regex::Regex;
use std::sync::LazyLock;

/// Matches RSpec's diff appendix: a `Diff:` or `Diff for (...):` header at
/// the start of any line, the first included, followed somewhere later by a
/// hunk marker or the empty-diff notice, through the end of the message.
///
/// Requiring `@@` or `The diff is empty` keeps user text that merely
/// mentions `Diff:` intact.
pub static DIFF_APPENDIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:\A|\n)\s*Diff(?:\s+for\s+\([^)]+\))?:.*?(?:@@|The diff is empty).*\z")
        .expect("Invalid DIFF_APPENDIX_REGEX")
});

/// Prepare a raw failure message for display.
///
/// Returns `None` when there is no message. Exactly one leading newline is
/// dropped; the diff appendix is removed unless `keep_embedded_diff` is set.
/// Applying this twice gives the same result as applying it once.
pub fn sanitize(raw_message: Option<&str>, keep_embedded_diff: bool) -> Option<String> {
    let message = raw_message?;
    let message = message.strip_prefix('\n').unwrap_or(message);

    if keep_embedded_diff {
        return Some(message.to_string());
    }

    Some(strip_diff_appendix(message))
}

/// Remove the first diff appendix and everything after it
pub fn strip_diff_appendix(message: &str) -> String {
    DIFF_APPENDIX_REGEX.replace(message, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "expected: \"foo\"\n     got: \"bar\"\n\n(compared using ==)";

    #[test]
    fn test_none_message() {
        assert_eq!(sanitize(None, false), None);
        assert_eq!(sanitize(None, true), None);
    }

    #[test]
    fn test_message_without_appendix_is_unchanged() {
        assert_eq!(sanitize(Some(BASE), false).as_deref(), Some(BASE));
    }

    #[test]
    fn test_strips_diff_appendix() {
        let message = format!("{}\n\n  Diff:\n@@ -1,2 +1,2 @@\n-foo\n+bar", BASE);
        assert_eq!(sanitize(Some(&message), false).as_deref(), Some(BASE));
    }

    #[test]
    fn test_strips_trailing_newline_appendix() {
        let message = format!("{}\n\nDiff:\n@@ -1 +1 @@\n-\"foo\"\n+\"bar\"\n", BASE);
        assert_eq!(sanitize(Some(&message), false).as_deref(), Some(BASE));
    }

    #[test]
    fn test_strips_labelled_diff_appendix() {
        let message = "expected 1 and 2\nDiff for (eq 1):\n@@ -1 +1 @@\n-1\n+3";
        assert_eq!(
            sanitize(Some(message), false).as_deref(),
            Some("expected 1 and 2")
        );
    }

    #[test]
    fn test_strips_empty_diff_notice() {
        let message = "expected same object\nDiff:\nThe diff is empty, are your objects producing identical `#inspect` output?";
        assert_eq!(
            sanitize(Some(message), false).as_deref(),
            Some("expected same object")
        );
    }

    #[test]
    fn test_keeps_diff_word_without_hunk() {
        let message = "expected response to include\nDiff: not a real diff";
        assert_eq!(sanitize(Some(message), false).as_deref(), Some(message));
    }

    #[test]
    fn test_keeps_appendix_when_requested() {
        let message = format!("{}\n\n  Diff:\n@@ -1,2 +1,2 @@\n-foo\n+bar", BASE);
        let kept = sanitize(Some(&message), true).unwrap();
        assert!(kept.contains("Diff:"));
        assert!(kept.contains("@@"));
        assert_eq!(kept, message);
    }

    #[test]
    fn test_strips_exactly_one_leading_newline() {
        assert_eq!(sanitize(Some("\nmessage"), false).as_deref(), Some("message"));
        assert_eq!(
            sanitize(Some("\n\nmessage"), true).as_deref(),
            Some("\nmessage")
        );
    }

    #[test]
    fn test_first_appendix_onward_is_removed() {
        let message =
            "both failed\nDiff for (eq 1):\n@@ -1 +1 @@\n-1\n+2\nDiff for (eq 3):\n@@ -1 +1 @@\n-3\n+4";
        assert_eq!(sanitize(Some(message), false).as_deref(), Some("both failed"));
    }

    #[test]
    fn test_header_on_first_line_is_an_appendix() {
        assert_eq!(sanitize(Some("Diff:\n@@ -1 +1 @@"), false).as_deref(), Some(""));
        assert_eq!(
            sanitize(Some("\nDiff:\n@@ -1 +1 @@\n-a\n+b"), false).as_deref(),
            Some("")
        );
        assert_eq!(
            sanitize(Some("  Diff for (eq 1):\nThe diff is empty"), false).as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_first_line_mention_without_hunk_is_kept() {
        let message = "Diff: nothing here\nexpected 1";
        assert_eq!(sanitize(Some(message), false).as_deref(), Some(message));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            BASE.to_string(),
            format!("{}\n\n  Diff:\n@@ -1,2 +1,2 @@\n-foo\n+bar", BASE),
            "\nleading\nDiff:\n@@ x".to_string(),
            "text\nDiff: mentioned\nmore\nDiff:\nThe diff is empty".to_string(),
            "a\nDiff for (x):\n@@\nDiff:\n@@".to_string(),
            "\nDiff:\n@@ -1 +1 @@\n-a\n+b".to_string(),
        ];

        for sample in &samples {
            let once = sanitize(Some(sample), false).unwrap();
            let twice = sanitize(Some(&once), false).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }
}
