//! Side-by-side line diff
//!
//! Splits a line diff of two texts into two HTML columns: the left column
//! holds unchanged and removed lines, the right column unchanged and added
//! lines.

use difference::{Changeset, Difference};

use crate::escape::html_escape;

/// How one line changed between the two texts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Unchanged,
    Removed,
    Added,
}

impl LineChange {
    fn css_class(&self) -> &'static str {
        match self {
            LineChange::Unchanged => "unchanged",
            LineChange::Removed => "del",
            LineChange::Added => "ins",
        }
    }
}

/// Both columns of a side-by-side diff, as HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDiff {
    pub left: String,
    pub right: String,
}

/// Line-by-line changes from `left_text` to `right_text`
pub fn diff_lines(left_text: &str, right_text: &str) -> Vec<(LineChange, String)> {
    let changeset = Changeset::new(left_text, right_text, "\n");

    let mut lines = Vec::new();
    for diff in &changeset.diffs {
        let (change, chunk) = match diff {
            Difference::Same(chunk) => (LineChange::Unchanged, chunk),
            Difference::Rem(chunk) => (LineChange::Removed, chunk),
            Difference::Add(chunk) => (LineChange::Added, chunk),
        };
        lines.extend(chunk.split('\n').map(|line| (change, line.to_string())));
    }
    lines
}

/// Diff two texts into left/right HTML columns
pub fn split_diff(left_text: &str, right_text: &str) -> SplitDiff {
    let lines = diff_lines(left_text, right_text);

    let left: Vec<_> = lines
        .iter()
        .filter(|(change, _)| *change != LineChange::Added)
        .collect();
    let right: Vec<_> = lines
        .iter()
        .filter(|(change, _)| *change != LineChange::Removed)
        .collect();

    SplitDiff {
        left: column_html(&left),
        right: column_html(&right),
    }
}

fn column_html(lines: &[&(LineChange, String)]) -> String {
    if lines.is_empty() {
        return r#"<div class="diff"></div>"#.to_string();
    }

    let mut html = String::from("<div class=\"diff\">\n  <ul>\n");
    for (change, text) in lines {
        let text = html_escape(text);
        let inner = match change {
            LineChange::Unchanged => format!("<span>{}</span>", text),
            LineChange::Removed => format!("<del>{}</del>", text),
            LineChange::Added => format!("<ins>{}</ins>", text),
        };
        html.push_str(&format!(
            "    <li class=\"{}\">{}</li>\n",
            change.css_class(),
            inner
        ));
    }
    html.push_str("  </ul>\n</div>");
    html
}
