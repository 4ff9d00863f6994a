//! # htmlmsg-core - Core Domain Types
//!
//! Foundation crate for html-messages. Provides the result record model, the
//! value codec for serialized actual/expected values, the structured
//! pretty-printer, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Result Records (`record`)
//! - [`ResultRecord`] - One example from an RSpec JSON report
//! - [`Details`], [`ExceptionInfo`] - Matcher details and raised exception
//! - [`Classification`] - Passed, matcher failure, or error before assertion
//! - [`parse_records()`] - Accept a record, an array, or a whole report
//!
//! ### Values (`value`)
//! - [`Value`] - Decoded actual/expected value, including cycle markers
//! - [`decode()`] - Total decoder that falls back to raw text
//!
//! ### Pretty Printing (`inspect`)
//! - [`PrettyPrinter`] - Seam between formatting policy and traversal
//! - [`InspectPrinter`] - Ruby-inspect style printer
//! - [`PrettyOptions`] - Printing policy
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum grouped by layer
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use htmlmsg_core::prelude::*;
//! ```

pub mod error;
pub mod inspect;
pub mod logging;
pub mod prelude;
pub mod record;
pub mod value;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
#[cfg(any(test, feature = "test-helpers"))]
pub use inspect::MockPrettyPrinter;
pub use inspect::{InspectPrinter, PrettyOptions, PrettyPrinter, DEFAULT_MAX_DEPTH};
pub use record::{
    parse_records, Classification, Details, ExceptionInfo, Report, ResultRecord, Serialized,
    Status,
};
pub use value::{decode, ContainerKind, CycleRef, Value};
