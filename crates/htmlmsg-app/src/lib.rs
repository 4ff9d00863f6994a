//! htmlmsg-app - Section composition for html-messages
//!
//! Turns one result record into the set of sections a renderer shows:
//! configuration loading, comparison formatting, the diffability policy,
//! failure message sanitizing, and backtrace cleaning.

pub mod backtrace;
pub mod compose;
pub mod config;
pub mod diffable;
pub mod formatter;
pub mod message;

// Re-export primary types
pub use backtrace::{BacktraceCleaner, BacktraceLine, CleanedBacktrace, FrameKind};
pub use compose::{
    compose, Comparison, ExceptionDetails, MatcherDebug, SectionComposer, Sections,
};
pub use config::{RenderOptions, Settings, SettingsOverrides};
pub use diffable::{is_diffable, matcher_type};
pub use formatter::format_for_comparison;
pub use message::sanitize;
