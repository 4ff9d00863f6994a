//! htmlmsg-render - HTML output for html-messages
//!
//! Renders composed [`Sections`](htmlmsg_app::Sections) as Bootstrap-style
//! cards, with a side-by-side line diff for comparisons.

pub mod diff;
pub mod escape;
pub mod html;
pub mod styles;

pub use diff::{split_diff, SplitDiff};
pub use escape::html_escape;
pub use html::{render_document, render_html};
pub use styles::{diff_css, style_block};
