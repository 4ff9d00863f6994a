//! Backtrace cleaning for exception display
//!
//! Project frames are made relative to the project root, frames from
//! installed gems and the Ruby installation are silenced, and the result is
//! cut to a configurable number of lines.

use htmlmsg_core::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::config::RenderOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Regex Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// Matches a versioned Ruby installation directory: `/ruby/3.2.2/`
pub static RUBY_INSTALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/ruby/\d+\.\d+\.\d+/").expect("Invalid RUBY_INSTALL_REGEX")
});

/// Matches a Windows drive prefix: `C:\`
pub static WINDOWS_DRIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]:\\").expect("Invalid WINDOWS_DRIVE_REGEX"));

/// RSpec's own libraries, silenced whatever the gem setting says
const RSPEC_INTERNALS: [&str; 3] = [
    "/lib/rspec/core/",
    "/lib/rspec/expectations/",
    "/lib/rspec/mocks/",
];

// ─────────────────────────────────────────────────────────────────────────────
// Frame Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Where a cleaned backtrace line points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Relative path, i.e. inside the project root
    Project,
    /// Absolute path outside the project
    External,
}

impl FrameKind {
    pub fn of(line: &str) -> Self {
        if line.starts_with('/') || WINDOWS_DRIVE_REGEX.is_match(line) {
            FrameKind::External
        } else {
            FrameKind::Project
        }
    }
}

/// One line of a cleaned backtrace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktraceLine {
    pub text: String,
    pub kind: FrameKind,
}

impl BacktraceLine {
    pub fn classify(line: &str) -> Self {
        Self {
            text: line.to_string(),
            kind: FrameKind::of(line),
        }
    }

    pub fn is_project(&self) -> bool {
        self.kind == FrameKind::Project
    }

    /// Display form: project frames get an arrow, others are indented
    pub fn display(&self) -> String {
        match self.kind {
            FrameKind::Project => format!("→ {}", self.text),
            FrameKind::External => format!("  {}", self.text),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cleaner
// ─────────────────────────────────────────────────────────────────────────────

type Filter = Box<dyn Fn(&str) -> String>;
type Silencer = Box<dyn Fn(&str) -> bool>;

/// Ordered line filters followed by silencers.
///
/// Every filter runs on every line, in the order added. A filtered line is
/// then dropped if any silencer returns true for it.
#[derive(Default)]
pub struct BacktraceCleaner {
    filters: Vec<Filter>,
    silencers: Vec<Silencer>,
}

impl std::fmt::Debug for BacktraceCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktraceCleaner")
            .field("filters", &self.filters.len())
            .field("silencers", &self.silencers.len())
            .finish()
    }
}

impl BacktraceCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleaner that only relativizes paths under `project_root`
    pub fn relativizing(project_root: &str) -> Self {
        let mut cleaner = Self::new();
        if !project_root.is_empty() {
            let prefix = format!("{}/", project_root);
            cleaner.add_filter(move |line| line.replace(&prefix, ""));
        }
        cleaner
    }

    /// Relativizing cleaner plus the standard silencers.
    ///
    /// Silencers only look at lines that are still absolute after filtering;
    /// project frames are never dropped.
    pub fn for_project(project_root: &str, silence_gems: bool) -> Self {
        let mut cleaner = Self::relativizing(project_root);

        if silence_gems {
            let root = project_root.to_string();
            cleaner.add_silencer(external_only(move |line| {
                line.contains("/gems/") && (root.is_empty() || !line.contains(&root))
            }));
            cleaner.add_silencer(external_only(|line| line.contains("/bundle/")));
            cleaner.add_silencer(external_only(|line| RUBY_INSTALL_REGEX.is_match(line)));
        }

        for internal in RSPEC_INTERNALS {
            cleaner.add_silencer(external_only(move |line| line.contains(internal)));
        }

        cleaner
    }

    pub fn add_filter<F>(&mut self, filter: F)
    where
        F: Fn(&str) -> String + 'static,
    {
        self.filters.push(Box::new(filter));
    }

    pub fn add_silencer<F>(&mut self, silencer: F)
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.silencers.push(Box::new(silencer));
    }

    /// Apply filters only
    pub fn filter(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| self.filter_line(line)).collect()
    }

    /// Apply filters, then drop silenced lines
    pub fn clean(&self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|line| self.filter_line(line))
            .filter(|line| !self.is_silenced(line))
            .collect()
    }

    fn filter_line(&self, line: &str) -> String {
        self.filters
            .iter()
            .fold(line.to_string(), |acc, filter| filter(&acc))
    }

    fn is_silenced(&self, line: &str) -> bool {
        self.silencers.iter().any(|silencer| silencer(line))
    }
}

fn external_only<F>(silencer: F) -> impl Fn(&str) -> bool + 'static
where
    F: Fn(&str) -> bool + 'static,
{
    move |line: &str| FrameKind::of(line) == FrameKind::External && silencer(line)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cleaned Backtrace
// ─────────────────────────────────────────────────────────────────────────────

/// Result of cleaning one exception's backtrace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanedBacktrace {
    /// Cleaned lines, outermost call first, at most `max_backtrace_lines`
    pub lines: Vec<String>,

    /// True if lines were cut to fit the limit
    pub truncated: bool,

    /// Number of lines before truncation
    pub total: usize,
}

impl CleanedBacktrace {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines cut by truncation
    pub fn hidden_count(&self) -> usize {
        self.total.saturating_sub(self.lines.len())
    }

    pub fn frames(&self) -> impl Iterator<Item = BacktraceLine> + '_ {
        self.lines.iter().map(|line| BacktraceLine::classify(line))
    }
}

/// Clean a raw backtrace for display.
///
/// If silencing drops every line, the relativized original lines are used
/// instead, so a non-empty trace never cleans to nothing.
pub fn clean(lines: &[String], project_root: &str, options: &RenderOptions) -> CleanedBacktrace {
    if lines.is_empty() {
        return CleanedBacktrace::default();
    }

    let cleaner = BacktraceCleaner::for_project(project_root, options.silence_known_library_frames);
    let mut cleaned = cleaner.clean(lines);

    if cleaned.is_empty() {
        debug!(
            "All {} backtrace lines silenced, falling back to relativized lines",
            lines.len()
        );
        cleaned = BacktraceCleaner::relativizing(project_root).filter(lines);
    }

    let total = cleaned.len();
    cleaned.truncate(options.max_backtrace_lines);

    CleanedBacktrace {
        truncated: cleaned.len() < total,
        lines: cleaned,
        total,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Project Root
// ─────────────────────────────────────────────────────────────────────────────

/// Project root for a spec file: two directories above the file's directory.
///
/// Resolution is lexical. A relative result is made absolute against
/// `working_dir` when one is given.
pub fn derive_project_root(file_path: &str, working_dir: Option<&Path>) -> String {
    let dir = Path::new(file_path).parent().unwrap_or(Path::new(""));
    let dir = match working_dir {
        Some(base) if dir.is_relative() => base.join(dir),
        _ => dir.to_path_buf(),
    };

    path_string(normalize(&dir.join("..").join("..")))
}

/// Project root for a record: the configured root if any, otherwise derived
/// from the record's file path
pub fn resolve_project_root(file_path: &str, options: &RenderOptions) -> String {
    match (&options.project_root, &options.working_dir) {
        (Some(root), Some(base)) if root.is_relative() => path_string(normalize(&base.join(root))),
        (Some(root), _) => path_string(normalize(root)),
        (None, base) => derive_project_root(file_path, base.as_deref()),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

fn path_string(path: PathBuf) -> String {
    let text = path.to_string_lossy().into_owned();
    if text.is_empty() {
        ".".to_string()
    } else {
        text
    }
}

/// Line number of the first backtrace frame inside `file_path`
pub fn line_in_file(lines: &[String], file_path: &str) -> Option<u32> {
    let needle = file_path.trim_start_matches("./");
    if needle.is_empty() {
        return None;
    }

    lines.iter().find_map(|line| {
        let start = line.find(needle)? + needle.len();
        let rest = line[start..].strip_prefix(':')?;
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/work/app";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn library_frame(i: usize) -> String {
        format!(
            "/usr/local/bundle/gems/rspec-core-3.13.0/lib/rspec/core/example.rb:{}:in `instance_exec'",
            100 + i
        )
    }

    #[test]
    fn test_empty_backtrace() {
        let result = clean(&[], ROOT, &RenderOptions::default());
        assert!(result.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_project_frames_are_relativized() {
        let raw = lines(&[
            "/work/app/app/models/user.rb:12:in `name'",
            "/work/app/spec/models/user_spec.rb:21:in `block (2 levels) in <top (required)>'",
        ]);

        let result = clean(&raw, ROOT, &RenderOptions::default());
        assert_eq!(
            result.lines,
            vec![
                "app/models/user.rb:12:in `name'",
                "spec/models/user_spec.rb:21:in `block (2 levels) in <top (required)>'",
            ]
        );
        assert!(!result.truncated);
    }

    #[test]
    fn test_library_frames_are_silenced() {
        let raw = lines(&[
            "/work/app/app/models/user.rb:12:in `name'",
            "/usr/local/bundle/gems/activesupport-7.1.0/lib/active_support/callbacks.rb:3:in `run'",
            "/home/me/.rubies/ruby/3.2.2/lib/ruby/3.2.0/forwardable.rb:238:in `size'",
            "/opt/ruby/3.3.0/lib/set.rb:10:in `each'",
            "/work/app/spec/models/user_spec.rb:21:in `block'",
        ]);

        let result = clean(&raw, ROOT, &RenderOptions::default());
        assert_eq!(
            result.lines,
            vec!["app/models/user.rb:12:in `name'", "spec/models/user_spec.rb:21:in `block'"]
        );
    }

    #[test]
    fn test_vendored_gem_inside_project_is_kept_when_absolute() {
        let root = "/srv/app";
        let raw = lines(&[
            "/srv/app-shared/gems/local/lib/thing.rb:1:in `x'",
            "/other/gems/foo/lib/foo.rb:1:in `y'",
        ]);

        let kept = BacktraceCleaner::for_project(root, true).clean(&raw);
        assert_eq!(kept, vec!["/srv/app-shared/gems/local/lib/thing.rb:1:in `x'"]);
    }

    #[test]
    fn test_rspec_internals_always_silenced() {
        let raw = lines(&[
            "/work/app/spec/a_spec.rb:3:in `block'",
            "/opt/rspec/lib/rspec/core/example.rb:263:in `instance_exec'",
            "/opt/rspec/lib/rspec/expectations/fail_with.rb:35:in `fail_with'",
            "/opt/rspec/lib/rspec/mocks/proxy.rb:10:in `x'",
            "/opt/other/lib/thing.rb:5:in `y'",
        ]);

        let options = RenderOptions::default().with_silence_known_library_frames(false);
        let result = clean(&raw, ROOT, &options);
        assert_eq!(
            result.lines,
            vec!["spec/a_spec.rb:3:in `block'", "/opt/other/lib/thing.rb:5:in `y'"]
        );
    }

    #[test]
    fn test_gem_frames_kept_when_not_silencing() {
        let raw = lines(&["/usr/local/bundle/gems/foo-1.0/lib/foo.rb:1:in `bar'"]);
        let options = RenderOptions::default().with_silence_known_library_frames(false);

        let result = clean(&raw, ROOT, &options);
        assert_eq!(result.lines, raw);
    }

    #[test]
    fn test_all_library_frames_fall_back_and_truncate() {
        let raw: Vec<String> = (0..20).map(library_frame).collect();
        let options = RenderOptions::default().with_max_backtrace_lines(5);

        let result = clean(&raw, ROOT, &options);
        assert_eq!(result.lines.len(), 5);
        assert!(result.truncated);
        assert_eq!(result.total, 20);
        assert_eq!(result.hidden_count(), 15);
        assert_eq!(result.lines, raw[..5].to_vec());
    }

    #[test]
    fn test_project_frames_survive_silencing() {
        let raw = lines(&[
            "/work/app/vendor/bundle/gems/foo/lib/foo.rb:1:in `bar'",
            "/usr/lib/ruby/3.2.0/set.rb:2:in `each'",
        ]);

        let result = clean(&raw, ROOT, &RenderOptions::default());
        assert_eq!(result.lines, vec!["vendor/bundle/gems/foo/lib/foo.rb:1:in `bar'"]);
        assert_eq!(result.total, 1);
    }

    #[test]
    fn test_truncation_preserves_order() {
        let raw: Vec<String> = (0..8)
            .map(|i| format!("/work/app/lib/step_{}.rb:{}:in `call'", i, i))
            .collect();
        let options = RenderOptions::default().with_max_backtrace_lines(3);

        let result = clean(&raw, ROOT, &options);
        assert_eq!(
            result.lines,
            vec![
                "lib/step_0.rb:0:in `call'",
                "lib/step_1.rb:1:in `call'",
                "lib/step_2.rb:2:in `call'",
            ]
        );
        assert!(result.truncated);
        assert_eq!(result.total, 8);
    }

    #[test]
    fn test_never_exceeds_limit() {
        for max in 0..4 {
            let raw: Vec<String> = (0..6).map(library_frame).collect();
            let options = RenderOptions::default().with_max_backtrace_lines(max);
            assert!(clean(&raw, ROOT, &options).lines.len() <= max);
        }
    }

    #[test]
    fn test_custom_cleaner_order() {
        let mut cleaner = BacktraceCleaner::new();
        cleaner.add_filter(|line| line.replace("a", "b"));
        cleaner.add_filter(|line| line.replace("b", "c"));
        cleaner.add_silencer(|line| line.starts_with("skip"));

        let raw = lines(&["aaa", "skip me", "xbx"]);
        assert_eq!(cleaner.clean(&raw), vec!["ccc", "xcx"]);
        assert_eq!(cleaner.filter(&raw), vec!["ccc", "skip me", "xcx"]);
    }

    #[test]
    fn test_empty_root_does_not_filter() {
        let raw = lines(&["/a/b.rb:1"]);
        assert_eq!(BacktraceCleaner::relativizing("").filter(&raw), raw);
    }

    #[test]
    fn test_frame_classification() {
        assert_eq!(FrameKind::of("spec/a_spec.rb:1"), FrameKind::Project);
        assert_eq!(FrameKind::of("/usr/lib/x.rb:1"), FrameKind::External);
        assert_eq!(FrameKind::of(r"C:\ruby\lib\x.rb:1"), FrameKind::External);

        let line = BacktraceLine::classify("spec/a_spec.rb:1");
        assert!(line.is_project());
        assert_eq!(line.display(), "→ spec/a_spec.rb:1");
        assert_eq!(BacktraceLine::classify("/x.rb:1").display(), "  /x.rb:1");
    }

    #[test]
    fn test_derive_project_root() {
        assert_eq!(
            derive_project_root("/work/app/spec/models/user_spec.rb", None),
            "/work/app"
        );
        assert_eq!(
            derive_project_root("./spec/models/user_spec.rb", Some(Path::new("/work/app"))),
            "/work/app"
        );
        assert_eq!(derive_project_root("spec/user_spec.rb", Some(Path::new("/w/app"))), "/w");
        assert_eq!(derive_project_root("/a_spec.rb", None), "/");
    }

    #[test]
    fn test_resolve_project_root() {
        let options = RenderOptions::default().with_working_dir("/work");
        assert_eq!(resolve_project_root("./spec/models/x_spec.rb", &options), "/work");

        let options = options.with_project_root("app");
        assert_eq!(resolve_project_root("ignored.rb", &options), "/work/app");

        let options = RenderOptions::default().with_project_root("/srv/app/");
        assert_eq!(resolve_project_root("ignored.rb", &options), "/srv/app");
    }

    #[test]
    fn test_line_in_file() {
        let raw = lines(&[
            "/work/app/app/models/user.rb:12:in `name'",
            "/work/app/spec/models/user_spec.rb:21:in `block (2 levels)'",
            "/work/app/spec/models/user_spec.rb:40:in `other'",
        ]);

        assert_eq!(line_in_file(&raw, "./spec/models/user_spec.rb"), Some(21));
        assert_eq!(line_in_file(&raw, "./spec/other_spec.rb"), None);
        assert_eq!(line_in_file(&raw, ""), None);
    }
}
