//! Configuration types for html-messages
//!
//! Defines:
//! - `RenderOptions` - Per-invocation options read by the pipeline
//! - `Settings` - Contents of `.htmlmsg/config.toml`
//! - Related sub-types and defaults

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Matcher used by both `contain_exactly` and `match_array`
pub const CONTAIN_EXACTLY_MATCHER: &str = "RSpec::Matchers::BuiltIn::ContainExactly";

/// Include matcher shows what is missing, not a line-by-line diff
pub const INCLUDE_MATCHER: &str = "RSpec::Matchers::BuiltIn::Include";

/// Default number of backtrace lines to show
pub const DEFAULT_MAX_BACKTRACE_LINES: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Render Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options for one render call
///
/// Every field is optional when deserialized; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderOptions {
    /// Matcher names always treated as diffable
    #[serde(default = "default_force_diffable")]
    pub force_diffable: BTreeSet<String>,

    /// Matcher names never treated as diffable (checked first)
    #[serde(default = "default_force_not_diffable")]
    pub force_not_diffable: BTreeSet<String>,

    /// Keep the diff appendix RSpec adds to failure messages
    #[serde(default)]
    pub show_rspec_diff_in_message: bool,

    #[serde(default = "default_max_backtrace_lines")]
    pub max_backtrace_lines: usize,

    /// Drop gem, bundler, and Ruby installation frames
    #[serde(default = "default_true")]
    pub silence_known_library_frames: bool,

    /// Explicit project root; derived from the record's file path when unset
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    /// Base directory for resolving relative file paths
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Add a matcher debug header to rendered output
    #[serde(default)]
    pub debug: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            force_diffable: default_force_diffable(),
            force_not_diffable: default_force_not_diffable(),
            show_rspec_diff_in_message: false,
            max_backtrace_lines: default_max_backtrace_lines(),
            silence_known_library_frames: true,
            project_root: None,
            working_dir: None,
            debug: false,
        }
    }
}

impl RenderOptions {
    /// Replace the force-diffable set
    pub fn with_force_diffable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_diffable = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the force-not-diffable set
    pub fn with_force_not_diffable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_not_diffable = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rspec_diff_in_message(mut self, keep: bool) -> Self {
        self.show_rspec_diff_in_message = keep;
        self
    }

    pub fn with_max_backtrace_lines(mut self, max: usize) -> Self {
        self.max_backtrace_lines = max;
        self
    }

    pub fn with_silence_known_library_frames(mut self, silence: bool) -> Self {
        self.silence_known_library_frames = silence;
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn default_force_diffable() -> BTreeSet<String> {
    BTreeSet::from([CONTAIN_EXACTLY_MATCHER.to_string()])
}

fn default_force_not_diffable() -> BTreeSet<String> {
    BTreeSet::from([INCLUDE_MATCHER.to_string()])
}

fn default_max_backtrace_lines() -> usize {
    DEFAULT_MAX_BACKTRACE_LINES
}

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings File
// ─────────────────────────────────────────────────────────────────────────────

/// Application settings (.htmlmsg/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub diff: DiffSettings,

    #[serde(default)]
    pub backtrace: BacktraceSettings,

    #[serde(default)]
    pub render: RenderSettings,
}

/// Diff and failure message settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiffSettings {
    #[serde(default = "default_force_diffable_list")]
    pub force_diffable: Vec<String>,

    #[serde(default = "default_force_not_diffable_list")]
    pub force_not_diffable: Vec<String>,

    /// Keep RSpec's own diff inside the failure message
    #[serde(default)]
    pub rspec_diff_in_message: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            force_diffable: default_force_diffable_list(),
            force_not_diffable: default_force_not_diffable_list(),
            rspec_diff_in_message: false,
        }
    }
}

fn default_force_diffable_list() -> Vec<String> {
    vec![CONTAIN_EXACTLY_MATCHER.to_string()]
}

fn default_force_not_diffable_list() -> Vec<String> {
    vec![INCLUDE_MATCHER.to_string()]
}

/// Backtrace settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BacktraceSettings {
    #[serde(default = "default_max_backtrace_lines")]
    pub max_lines: usize,

    /// Hide frames from installed gems and the Ruby installation
    #[serde(default = "default_true")]
    pub silence_gems: bool,
}

impl Default for BacktraceSettings {
    fn default() -> Self {
        Self {
            max_lines: default_max_backtrace_lines(),
            silence_gems: true,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub project_root: Option<PathBuf>,
}

impl Settings {
    /// Build the per-call options these settings describe
    pub fn to_render_options(&self) -> RenderOptions {
        RenderOptions {
            force_diffable: self.diff.force_diffable.iter().cloned().collect(),
            force_not_diffable: self.diff.force_not_diffable.iter().cloned().collect(),
            show_rspec_diff_in_message: self.diff.rspec_diff_in_message,
            max_backtrace_lines: self.backtrace.max_lines,
            silence_known_library_frames: self.backtrace.silence_gems,
            project_root: self.render.project_root.clone(),
            working_dir: None,
            debug: self.render.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults() {
        let options = RenderOptions::default();
        assert!(options.force_diffable.contains(CONTAIN_EXACTLY_MATCHER));
        assert!(options.force_not_diffable.contains(INCLUDE_MATCHER));
        assert!(!options.show_rspec_diff_in_message);
        assert_eq!(options.max_backtrace_lines, 10);
        assert!(options.silence_known_library_frames);
        assert!(options.project_root.is_none());
        assert!(!options.debug);
    }

    #[test]
    fn test_render_options_from_partial_json() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"max_backtrace_lines": 3, "force_diffable": ["Eq"]}"#)
                .unwrap();
        assert_eq!(options.max_backtrace_lines, 3);
        assert_eq!(options.force_diffable, BTreeSet::from(["Eq".to_string()]));
        assert!(options.force_not_diffable.contains(INCLUDE_MATCHER));
        assert!(options.silence_known_library_frames);
    }

    #[test]
    fn test_render_options_builders() {
        let options = RenderOptions::default()
            .with_force_diffable(["A"])
            .with_force_not_diffable(Vec::<String>::new())
            .with_rspec_diff_in_message(true)
            .with_max_backtrace_lines(5)
            .with_silence_known_library_frames(false)
            .with_project_root("/proj")
            .with_debug(true);

        assert_eq!(options.force_diffable.len(), 1);
        assert!(options.force_not_diffable.is_empty());
        assert!(options.show_rspec_diff_in_message);
        assert_eq!(options.max_backtrace_lines, 5);
        assert!(!options.silence_known_library_frames);
        assert_eq!(options.project_root, Some(PathBuf::from("/proj")));
        assert!(options.debug);
    }

    #[test]
    fn test_default_settings_match_default_options() {
        assert_eq!(Settings::default().to_render_options(), RenderOptions::default());
    }
}
