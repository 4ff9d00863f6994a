//! Value formatting for side-by-side comparison
//!
//! Fixes the printing policy for diffs (sorted keys, no indices, no object
//! ids, two-space indent, instance fields shown) and hands traversal to a
//! [`PrettyPrinter`].

use htmlmsg_core::prelude::*;
use htmlmsg_core::{PrettyOptions, PrettyPrinter, Value, DEFAULT_MAX_DEPTH};

/// Printing policy used for comparison text
pub const COMPARISON_OPTIONS: PrettyOptions = PrettyOptions {
    sort_keys: true,
    index: false,
    indent: -2,
    object_id: false,
    raw: true,
    max_depth: DEFAULT_MAX_DEPTH,
};

/// Turn a decoded value into stable, diff-ready text.
///
/// Strings are returned as they are and an absent value reads `nil`.
/// If the printer fails, the value's plain single-line form is used instead.
pub fn format_for_comparison<P>(value: &Value, printer: &P) -> String
where
    P: PrettyPrinter + ?Sized,
{
    match value {
        Value::Str(text) => text.clone(),
        Value::Absent => "nil".to_string(),
        other => match printer.pretty(other, &COMPARISON_OPTIONS) {
            Ok(text) => text,
            Err(e) => {
                warn!("Pretty-printing failed, using plain form: {}", e);
                other.to_plain_string()
            }
        },
    }
}
