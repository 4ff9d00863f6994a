//! html-messages library
//!
//! Loads RSpec example results and renders them as HTML or NDJSON. The
//! pipeline itself lives in the workspace crates; this crate wires them to
//! the `htmlmsg` command line.

pub mod input;
pub mod output;

pub use input::{load_records, InputSource};
pub use output::{render_records, ExampleOutput, OutputFormat};

// Re-export the workspace crates for library users
pub use htmlmsg_app as app;
pub use htmlmsg_core as core;
pub use htmlmsg_render as render;
