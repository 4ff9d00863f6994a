//! Settings parser for .htmlmsg/config.toml

use super::types::Settings;
use htmlmsg_core::prelude::*;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";
const HTMLMSG_DIR: &str = ".htmlmsg";

/// Command-line values layered over the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub force_diffable: Vec<String>,
    pub force_not_diffable: Vec<String>,
    pub rspec_diff_in_message: Option<bool>,
    pub backtrace_max_lines: Option<usize>,
    pub silence_gems: Option<bool>,
    pub debug: Option<bool>,
    pub project_root: Option<PathBuf>,
}

impl Settings {
    /// Layer command-line overrides on top of file settings.
    ///
    /// A matcher named on the command line moves out of the opposite list, so
    /// `--force-diffable X` wins over a configured or default
    /// `force_not_diffable` entry for `X`.
    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        for name in &overrides.force_diffable {
            self.diff.force_not_diffable.retain(|n| n != name);
            if !self.diff.force_diffable.contains(name) {
                self.diff.force_diffable.push(name.clone());
            }
        }

        for name in &overrides.force_not_diffable {
            self.diff.force_diffable.retain(|n| n != name);
            if !self.diff.force_not_diffable.contains(name) {
                self.diff.force_not_diffable.push(name.clone());
            }
        }

        if let Some(keep) = overrides.rspec_diff_in_message {
            self.diff.rspec_diff_in_message = keep;
        }
        if let Some(max) = overrides.backtrace_max_lines {
            self.backtrace.max_lines = max;
        }
        if let Some(silence) = overrides.silence_gems {
            self.backtrace.silence_gems = silence;
        }
        if let Some(debug) = overrides.debug {
            self.render.debug = debug;
        }
        if let Some(root) = &overrides.project_root {
            self.render.project_root = Some(root.clone());
        }
    }
}

/// Path of the settings file for a project directory
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(HTMLMSG_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.htmlmsg/config.toml`
///
/// Missing or invalid files fall back to defaults.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Load settings from an explicit file, reporting every failure
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::config_not_found(path));
    }

    let content = std::fs::read_to_string(path)?;
    let settings = toml::from_str(&content)?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Create a default config file in the .htmlmsg/ directory
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let htmlmsg_dir = project_path.join(HTMLMSG_DIR);

    if !htmlmsg_dir.exists() {
        std::fs::create_dir_all(&htmlmsg_dir)
            .map_err(|e| Error::config(format!("Failed to create .htmlmsg dir: {}", e)))?;
    }

    let config_path = htmlmsg_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# html-messages configuration

[diff]
# Matchers that always get a side-by-side diff
force_diffable = ["RSpec::Matchers::BuiltIn::ContainExactly"]
# Matchers that never get one (checked first)
force_not_diffable = ["RSpec::Matchers::BuiltIn::Include"]
# Keep RSpec's own "Diff:" appendix in failure messages
rspec_diff_in_message = false

[backtrace]
max_lines = 10
# Hide frames from gems, bundler, and the Ruby installation
silence_gems = true

[render]
debug = false
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}
