//! Diffability policy
//!
//! Decides whether a side-by-side diff suits a matcher's actual/expected
//! pair. Caller overrides beat the matcher's own hint: some matchers report
//! "not diffable" although a line diff reads well (order-insensitive
//! collection matchers), others report "diffable" but produce misleading
//! diffs (inclusion matchers).

use crate::config::RenderOptions;

/// Name used when a record does not say which matcher ran
pub const UNKNOWN_MATCHER: &str = "Unknown";

/// Decide whether a diff should be rendered for `matcher_name`.
///
/// Decision order, first match wins:
/// 1. listed in `force_not_diffable` → `false`
/// 2. listed in `force_diffable` → `true`
/// 3. the matcher's own hint (absent counts as `false`)
///
/// A name listed in both sets is therefore not diffable.
pub fn is_diffable(matcher_name: &str, details_hint: Option<bool>, options: &RenderOptions) -> bool {
    if options.force_not_diffable.contains(matcher_name) {
        return false;
    }
    if options.force_diffable.contains(matcher_name) {
        return true;
    }
    details_hint.unwrap_or(false)
}

/// Human-readable matcher family, shown in the debug header
pub fn matcher_type(matcher_name: &str) -> &'static str {
    if matcher_name.contains("DSL::Matcher") {
        "Custom DSL Matcher"
    } else if matcher_name.contains("BuiltIn") {
        "Built-in Matcher"
    } else {
        "Matcher"
    }
}
