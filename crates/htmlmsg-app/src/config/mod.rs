//! Configuration for html-messages
//!
//! Supports:
//! - `.htmlmsg/config.toml` - Project settings
//! - Command-line overrides layered on top of the file
//! - `RenderOptions` - The per-call view the pipeline reads

pub mod settings;
pub mod types;

pub use settings::{
    config_path, init_config_dir, load_settings, load_settings_from, SettingsOverrides,
};
pub use types::*;
