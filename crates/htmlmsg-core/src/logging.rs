//! Logging configuration using tracing
//!
//! Rendered HTML and NDJSON go to stdout, so log records are written to a
//! daily rolling file instead.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable that overrides the log filter
pub const LOG_ENV_VAR: &str = "HTMLMSG_LOG";

/// Filter used when `HTMLMSG_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "html_messages=info,htmlmsg_app=info,htmlmsg_core=info,warn";

const LOG_FILE_NAME: &str = "htmlmsg.log";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/html-messages/logs/`.
/// Log level is controlled by the `HTMLMSG_LOG` environment variable.
///
/// # Examples
/// ```bash
/// HTMLMSG_LOG=debug htmlmsg report.json
/// HTMLMSG_LOG=htmlmsg_app::compose=trace htmlmsg report.json
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        "htmlmsg {} rendering RSpec results (logs in {})",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );

    Ok(())
}

/// Directory holding the rolling log files
fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("html-messages").join("logs")
}
