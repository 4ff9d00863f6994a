//! Result record types
//!
//! A [`ResultRecord`] is one example from an RSpec JSON report, optionally
//! enriched with matcher details. Records are read-only input: nothing in the
//! pipeline mutates them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a single example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Pending,
    /// Any status string we do not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn is_failed(&self) -> bool {
        matches!(self, Status::Failed)
    }

    /// CSS-friendly status label; everything that is not a pass counts as failed
    pub fn css_class(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            _ => "failed",
        }
    }
}

/// A serialized actual/expected slot.
///
/// Tracks key presence separately from the value so that `"actual": null`
/// still counts as "the matcher reported an actual value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Serialized {
    /// Key absent from `details`
    #[default]
    Missing,
    /// Key present with JSON `null`
    Null,
    /// Serialized value text
    Text(String),
}

impl Serialized {
    pub fn text(value: impl Into<String>) -> Self {
        Serialized::Text(value.into())
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Serialized::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Serialized::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Serialized {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Upstream always sends strings, but tolerate raw JSON values too
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Serialized::Null,
            serde_json::Value::String(text) => Serialized::Text(text),
            other => Serialized::Text(other.to_string()),
        })
    }
}

/// Matcher details attached to an example
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Details {
    #[serde(default)]
    pub matcher_name: Option<String>,

    /// The matcher's own opinion on whether a diff makes sense
    #[serde(default)]
    pub diffable: Option<bool>,

    #[serde(default)]
    pub negated: Option<bool>,

    #[serde(default)]
    pub expected: Serialized,

    #[serde(default)]
    pub actual: Serialized,

    /// The matcher's message when a custom failure message replaced it
    #[serde(default)]
    pub original_message: Option<String>,
}

impl Details {
    pub fn has_expected(&self) -> bool {
        self.expected.is_present()
    }

    pub fn has_actual(&self) -> bool {
        self.actual.is_present()
    }

    pub fn is_negated(&self) -> bool {
        self.negated.unwrap_or(false)
    }
}

/// Exception raised while running the example
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionInfo {
    #[serde(default)]
    pub class: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub backtrace: Option<Vec<String>>,
}

impl ExceptionInfo {
    /// Backtrace lines, empty when none were recorded
    pub fn backtrace_lines(&self) -> &[String] {
        self.backtrace.as_deref().unwrap_or(&[])
    }
}

/// How a record should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The example passed (or is not a failure)
    Passed,
    /// A matcher ran and reported a mismatch
    MatcherFailure,
    /// Code raised before any matcher produced actual/expected values
    Error,
}

/// One example result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub full_description: Option<String>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub line_number: Option<u32>,

    #[serde(default)]
    pub details: Option<Details>,

    #[serde(default)]
    pub exception: Option<ExceptionInfo>,
}

impl ResultRecord {
    /// Parse a single record from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Details, or an empty set when the record carries none
    pub fn details(&self) -> Details {
        self.details.clone().unwrap_or_default()
    }

    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// True when code raised before any matcher produced values
    pub fn is_error_before_assertion(&self) -> bool {
        let (has_actual, has_expected) = self
            .details
            .as_ref()
            .map(|d| (d.has_actual(), d.has_expected()))
            .unwrap_or((false, false));
        self.has_exception() && !has_actual && !has_expected
    }

    /// Classify the record for section composition.
    ///
    /// Anything that did not fail is `Passed`, even with an exception attached.
    pub fn classify(&self) -> Classification {
        if !self.status.is_failed() {
            Classification::Passed
        } else if self.is_error_before_assertion() {
            Classification::Error
        } else {
            Classification::MatcherFailure
        }
    }

    pub fn exception_message(&self) -> Option<&str> {
        self.exception.as_ref().and_then(|e| e.message.as_deref())
    }

    pub fn exception_class(&self) -> Option<&str> {
        self.exception.as_ref().and_then(|e| e.class.as_deref())
    }

    pub fn backtrace_lines(&self) -> &[String] {
        self.exception
            .as_ref()
            .map(|e| e.backtrace_lines())
            .unwrap_or(&[])
    }
}

/// RSpec JSON formatter output (`rspec --format json`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub examples: Vec<ResultRecord>,
}

/// Parse input that is either one record, an array of records, or a full report
pub fn parse_records(json: &str) -> Result<Vec<ResultRecord>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let is_report = value
        .as_object()
        .is_some_and(|map| map.contains_key("examples"));

    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(_) if is_report => {
            let report: Report = serde_json::from_value(value)?;
            Ok(report.examples)
        }
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(Error::invalid_record(format!(
            "expected a JSON object or array, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
