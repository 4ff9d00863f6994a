//! Section composition
//!
//! Classifies a result record and decides which sections to show, wiring
//! the formatter, the diffability policy, the message sanitizer and the
//! backtrace cleaner together. Decoded and formatted values are cached for
//! the lifetime of one [`SectionComposer`].

use std::cell::OnceCell;

use htmlmsg_core::prelude::*;
use htmlmsg_core::{decode, Classification, Details, PrettyPrinter, ResultRecord, Value};
use serde::Serialize;

use crate::backtrace::{self, CleanedBacktrace};
use crate::config::RenderOptions;
use crate::diffable::{is_diffable, matcher_type, UNKNOWN_MATCHER};
use crate::formatter::format_for_comparison;
use crate::message::sanitize;

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Expected and actual text for a side-by-side diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub expected: String,
    pub actual: String,
    pub matcher_name: String,
    pub diffable: bool,
}

/// Exception shown when code raised before any matcher ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionDetails {
    pub class: Option<String>,
    pub message: Option<String>,
    /// Line of the first frame inside the spec file, else the example's line
    pub line_number: Option<u32>,
}

/// Matcher facts for the debug header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatcherDebug {
    pub matcher_name: String,
    pub matcher_type: String,
    pub diffable_hint: Option<bool>,
    pub effective_diffable: bool,
    pub negated: bool,
}

/// Sections to render for one record. Absent sections are not shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<CleanedBacktrace>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<MatcherDebug>,
}

impl Sections {
    /// True if no content section is present (the debug header is ignored)
    pub fn is_empty(&self) -> bool {
        self.comparison.is_none()
            && self.actual_output.is_none()
            && self.failure_message.is_none()
            && self.exception_details.is_none()
            && self.backtrace.is_none()
    }

    /// Names of the present sections, in render order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.comparison.is_some() {
            names.push("comparison");
        }
        if self.actual_output.is_some() {
            names.push("actual_output");
        }
        if self.failure_message.is_some() {
            names.push("failure_message");
        }
        if self.exception_details.is_some() {
            names.push("exception_details");
        }
        if self.backtrace.is_some() {
            names.push("backtrace");
        }
        names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Composer
// ─────────────────────────────────────────────────────────────────────────────

/// Per-record composer with cached decoded and formatted values
pub struct SectionComposer<'a, P: PrettyPrinter + ?Sized> {
    record: &'a ResultRecord,
    options: &'a RenderOptions,
    printer: &'a P,
    details: Details,
    expected: OnceCell<Value>,
    actual: OnceCell<Value>,
    formatted_expected: OnceCell<String>,
    formatted_actual: OnceCell<String>,
}

impl<'a, P: PrettyPrinter + ?Sized> SectionComposer<'a, P> {
    pub fn new(record: &'a ResultRecord, options: &'a RenderOptions, printer: &'a P) -> Self {
        Self {
            record,
            options,
            printer,
            details: record.details(),
            expected: OnceCell::new(),
            actual: OnceCell::new(),
            formatted_expected: OnceCell::new(),
            formatted_actual: OnceCell::new(),
        }
    }

    pub fn matcher_name(&self) -> &str {
        self.details.matcher_name.as_deref().unwrap_or(UNKNOWN_MATCHER)
    }

    pub fn expected_value(&self) -> &Value {
        self.expected
            .get_or_init(|| decode(self.details.expected.as_text()))
    }

    pub fn actual_value(&self) -> &Value {
        self.actual.get_or_init(|| decode(self.details.actual.as_text()))
    }

    pub fn formatted_expected(&self) -> &str {
        self.formatted_expected
            .get_or_init(|| format_for_comparison(self.expected_value(), self.printer))
    }

    pub fn formatted_actual(&self) -> &str {
        self.formatted_actual
            .get_or_init(|| format_for_comparison(self.actual_value(), self.printer))
    }

    pub fn effective_diffable(&self) -> bool {
        is_diffable(self.matcher_name(), self.details.diffable, self.options)
    }

    /// Whether a side-by-side comparison should be shown.
    ///
    /// Requires a failed example with both values present, a non-negated
    /// match, textually different values and a diffable matcher.
    pub fn show_comparison(&self) -> bool {
        if !self.record.status.is_failed() {
            return false;
        }
        if self.expected_value().is_absent() || self.actual_value().is_absent() {
            return false;
        }
        if self.details.is_negated() {
            return false;
        }
        if self.formatted_actual() == self.formatted_expected() {
            return false;
        }
        self.effective_diffable()
    }

    pub fn debug_info(&self) -> MatcherDebug {
        let matcher_name = self.matcher_name().to_string();
        MatcherDebug {
            matcher_type: matcher_type(&matcher_name).to_string(),
            matcher_name,
            diffable_hint: self.details.diffable,
            effective_diffable: self.effective_diffable(),
            negated: self.details.is_negated(),
        }
    }

    pub fn compose(&self) -> Sections {
        let classification = self.record.classify();

        let mut sections = match classification {
            Classification::Passed => Sections::default(),
            Classification::MatcherFailure => self.matcher_failure_sections(),
            Classification::Error => Sections {
                exception_details: Some(self.exception_details()),
                backtrace: self.backtrace(),
                ..Default::default()
            },
        };

        if self.options.debug {
            sections.debug = Some(self.debug_info());
        }

        debug!(
            "Composed {:?} for {:?}: [{}]",
            classification,
            self.record.description,
            sections.names().join(", ")
        );

        sections
    }

    fn matcher_failure_sections(&self) -> Sections {
        let comparison = self.show_comparison().then(|| Comparison {
            expected: self.formatted_expected().to_string(),
            actual: self.formatted_actual().to_string(),
            matcher_name: self.matcher_name().to_string(),
            diffable: true,
        });

        let actual_output = if comparison.is_none() && !self.actual_value().is_absent() {
            Some(self.formatted_actual().to_string())
        } else {
            None
        };

        Sections {
            comparison,
            actual_output,
            failure_message: sanitize(
                self.record.exception_message(),
                self.options.show_rspec_diff_in_message,
            ),
            ..Default::default()
        }
    }

    fn exception_details(&self) -> ExceptionDetails {
        let line_number = backtrace::line_in_file(
            self.record.backtrace_lines(),
            &self.record.file_path,
        )
        .or(self.record.line_number);

        ExceptionDetails {
            class: self.record.exception_class().map(str::to_string),
            message: sanitize(
                self.record.exception_message(),
                self.options.show_rspec_diff_in_message,
            ),
            line_number,
        }
    }

    fn backtrace(&self) -> Option<CleanedBacktrace> {
        let lines = self.record.backtrace_lines();
        if lines.is_empty() {
            return None;
        }

        let root = backtrace::resolve_project_root(&self.record.file_path, self.options);
        Some(backtrace::clean(lines, &root, self.options))
    }
}

/// Compose the sections for one record
pub fn compose<P>(record: &ResultRecord, options: &RenderOptions, printer: &P) -> Sections
where
    P: PrettyPrinter + ?Sized,
{
    SectionComposer::new(record, options, printer).compose()
}
