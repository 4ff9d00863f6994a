//! htmlmsg - Render RSpec example results as readable HTML
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use html_messages::app::config::{
    init_config_dir, load_settings, load_settings_from, SettingsOverrides,
};
use html_messages::core::prelude::*;
use html_messages::{load_records, render_records, InputSource, OutputFormat};

/// htmlmsg - Render RSpec example results as readable HTML
#[derive(Parser, Debug)]
#[command(name = "htmlmsg")]
#[command(version, about = "Render RSpec example results as readable HTML", long_about = None)]
struct Args {
    /// JSON file with one example or a full `rspec --format json` report (stdin if absent or `-`)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Settings file to use instead of .htmlmsg/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Always show a diff for this matcher (repeatable)
    #[arg(long, value_name = "MATCHER")]
    force_diffable: Vec<String>,

    /// Never show a diff for this matcher (repeatable)
    #[arg(long, value_name = "MATCHER")]
    force_not_diffable: Vec<String>,

    /// Keep RSpec's own diff inside failure messages
    #[arg(long)]
    rspec_diff_in_message: bool,

    /// Maximum number of backtrace lines to show
    #[arg(long, value_name = "N")]
    backtrace_max_lines: Option<usize>,

    /// Show frames from gems and the Ruby installation
    #[arg(long)]
    no_silence_gems: bool,

    /// Add a matcher debug header to each example
    #[arg(long)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Project root used to shorten backtrace paths
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Write a default .htmlmsg/config.toml and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            force_diffable: self.force_diffable.clone(),
            force_not_diffable: self.force_not_diffable.clone(),
            rspec_diff_in_message: self.rspec_diff_in_message.then_some(true),
            backtrace_max_lines: self.backtrace_max_lines,
            silence_gems: self.no_silence_gems.then_some(false),
            debug: self.debug.then_some(true),
            project_root: self.project_root.clone(),
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Logging goes to a file; stdout carries the rendered output
    if let Err(e) = html_messages::core::logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let args = Args::parse();
    let working_dir = std::env::current_dir()?;

    if args.init_config {
        init_config_dir(&working_dir)?;
        eprintln!(
            "✅ Wrote default settings to {}",
            working_dir.join(".htmlmsg").join("config.toml").display()
        );
        return Ok(());
    }

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(&working_dir),
    };
    settings.apply_overrides(&args.overrides());
    let options = settings.to_render_options().with_working_dir(&working_dir);

    let source = InputSource::from_arg(args.path.as_deref());
    let records = match load_records(&source) {
        Ok(records) => records,
        Err(e) => {
            error!("Input error: {}", e);
            eprintln!("❌ {}", e);
            eprintln!();
            eprintln!("Expected a JSON object for one example, an array of examples,");
            eprintln!("or the output of `rspec --format json`.");
            std::process::exit(1);
        }
    };

    let output = render_records(&records, &options, args.format)?;
    println!("{}", output);
    Ok(())
}
