//! Output rendering for the command line
//!
//! `html` prints one document with the stylesheet included once and one
//! block per example. `json` prints NDJSON, one line per example.

use htmlmsg_app::{compose, RenderOptions, Sections};
use htmlmsg_core::prelude::*;
use htmlmsg_core::{Classification, InspectPrinter, ResultRecord, Status};
use htmlmsg_render::{render_document, render_html};
use serde::Serialize;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

/// One NDJSON line
#[derive(Debug, Serialize)]
pub struct ExampleOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub description: &'a str,
    pub status: Status,
    pub classification: Classification,
    #[serde(flatten)]
    pub sections: &'a Sections,
}

/// Render every record in the chosen format
pub fn render_records(
    records: &[ResultRecord],
    options: &RenderOptions,
    format: OutputFormat,
) -> Result<String> {
    let composed: Vec<(&ResultRecord, Sections)> = records
        .iter()
        .map(|record| (record, compose(record, options, &InspectPrinter)))
        .collect();

    info!("Rendering {} example(s) as {:?}", composed.len(), format);

    match format {
        OutputFormat::Html => {
            let blocks: Vec<String> = composed
                .iter()
                .map(|(record, sections)| render_html(record, sections, options))
                .collect();
            Ok(render_document(&blocks))
        }
        OutputFormat::Json => {
            let mut lines = Vec::with_capacity(composed.len());
            for (record, sections) in &composed {
                let line = ExampleOutput {
                    id: record.id.as_deref(),
                    description: &record.description,
                    status: record.status,
                    classification: record.classify(),
                    sections,
                };
                lines.push(serde_json::to_string(&line)?);
            }
            Ok(lines.join("\n"))
        }
    }
}
