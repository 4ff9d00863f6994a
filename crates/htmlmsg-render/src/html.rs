//! HTML markup for composed sections
//!
//! Each record renders as one `rspec-html-messages` block of cards. All text
//! taken from the record is escaped.

use htmlmsg_app::{
    CleanedBacktrace, Comparison, ExceptionDetails, MatcherDebug, RenderOptions, Sections,
};
use htmlmsg_core::ResultRecord;

use crate::diff::split_diff;
use crate::escape::html_escape;
use crate::styles::style_block;

/// Render one record's sections as an HTML block
pub fn render_html(record: &ResultRecord, sections: &Sections, options: &RenderOptions) -> String {
    let mut html = format!(
        "<div class=\"rspec-html-messages\" data-status=\"{}\">\n",
        record.status.css_class()
    );

    if options.debug {
        if let Some(debug) = &sections.debug {
            html.push_str(&debug_header(debug));
        }
    }
    if let Some(comparison) = &sections.comparison {
        html.push_str(&comparison_cards(comparison));
    }
    if let Some(actual) = &sections.actual_output {
        html.push_str(&actual_card(actual));
    }
    if let Some(message) = &sections.failure_message {
        html.push_str(&failure_message_card(message));
    }
    if let Some(details) = &sections.exception_details {
        html.push_str(&exception_card(details));
    }
    if let Some(backtrace) = &sections.backtrace {
        html.push_str(&backtrace_card(backtrace));
    }

    html.push_str("</div>");
    html
}

/// Join rendered blocks into one document with the stylesheet included once
pub fn render_document(blocks: &[String]) -> String {
    let mut document = style_block();
    for block in blocks {
        document.push('\n');
        document.push_str(block);
    }
    document
}

fn card(header_class: &str, header: &str, body: &str) -> String {
    let header_class = if header_class.is_empty() {
        "card-header".to_string()
    } else {
        format!("card-header {}", header_class)
    };
    format!(
        "  <div class=\"{}\">{}</div>\n  <div class=\"card-body\">\n{}\n  </div>\n",
        header_class, header, body
    )
}

fn debug_header(debug: &MatcherDebug) -> String {
    let hint = match debug.diffable_hint {
        Some(hint) => hint.to_string(),
        None => "unset".to_string(),
    };
    format!(
        "<div class=\"debug-info\"><strong>Matcher:</strong> {} ({}) | diffable: {} | effective: {} | negated: {}</div>\n",
        html_escape(&debug.matcher_name),
        debug.matcher_type,
        hint,
        debug.effective_diffable,
        debug.negated
    )
}

fn comparison_cards(comparison: &Comparison) -> String {
    let diff = split_diff(&comparison.expected, &comparison.actual);
    format!(
        "<div class=\"card-group\">\n<div class=\"card\">\n{}</div>\n<div class=\"card\">\n{}</div>\n</div>\n",
        card("", "Expected", &diff.left),
        card("", "Actual", &diff.right)
    )
}

fn actual_card(actual: &str) -> String {
    format!(
        "<div class=\"card\">\n{}</div>\n",
        card("", "Actual", &format!("<pre>{}</pre>", html_escape(actual)))
    )
}

fn failure_message_card(message: &str) -> String {
    format!(
        "<div class=\"card failure-message\">\n{}</div>\n",
        card(
            "bg-warning text-bg-warning",
            "Test failure message",
            &format!("<pre>{}</pre>", html_escape(message))
        )
    )
}

fn exception_card(details: &ExceptionDetails) -> String {
    let class = details.class.as_deref().unwrap_or("Exception");
    let summary = match details.line_number {
        Some(line) => format!("{} on line {}", html_escape(class), line),
        None => html_escape(class),
    };

    let mut body = format!("<p><strong>{}</strong></p>", summary);
    if let Some(message) = &details.message {
        body.push_str(&format!(
            "\n<pre class=\"text-danger\">{}</pre>",
            html_escape(message)
        ));
    }

    format!(
        "<div class=\"card exception-details\">\n{}</div>\n",
        card("bg-danger text-bg-danger", "Error in code", &body)
    )
}

fn backtrace_card(backtrace: &CleanedBacktrace) -> String {
    let lines: Vec<String> = backtrace
        .frames()
        .map(|frame| {
            let kind = if frame.is_project() { "project" } else { "external" };
            format!(
                "<span class=\"backtrace-line {}\">{}</span>",
                kind,
                html_escape(&frame.display())
            )
        })
        .collect();

    let mut body = format!("<pre>{}</pre>", lines.join("\n"));
    if backtrace.truncated {
        body.push_str(&format!(
            "\n<small class=\"frames-omitted\">{} more frames omitted</small>",
            backtrace.hidden_count()
        ));
    }

    format!(
        "<div class=\"card bg-dark text-white backtrace\">\n{}</div>\n",
        card("", "Backtrace:", &body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlmsg_app::compose;
    use htmlmsg_core::InspectPrinter;
    use insta::assert_snapshot;

    fn record(json: &str) -> ResultRecord {
        ResultRecord::from_json(json).unwrap()
    }

    fn render(json: &str, options: &RenderOptions) -> String {
        let record = record(json);
        let sections = compose(&record, options, &InspectPrinter);
        render_html(&record, &sections, options)
    }

    #[test]
    fn test_passed_record_renders_empty_block() {
        let html = render(r#"{"status": "passed"}"#, &RenderOptions::default());
        assert_snapshot!(html, @r#"
        <div class="rspec-html-messages" data-status="passed">
        </div>
        "#);
    }

    #[test]
    fn test_comparison_renders_expected_and_actual_cards() {
        let html = render(
            r#"{"status": "failed", "details": {"matcher_name": "Eq", "diffable": true,
                "expected": "\"foo\"", "actual": "\"bar\""},
                "exception": {"message": "expected: \"foo\"\n     got: \"bar\""}}"#,
            &RenderOptions::default(),
        );

        assert!(html.contains("<div class=\"card-group\">"));
        let expected_at = html.find(">Expected<").unwrap();
        let actual_at = html.find(">Actual<").unwrap();
        assert!(expected_at < actual_at);
        assert!(html.contains("<del>foo</del>"));
        assert!(html.contains("<ins>bar</ins>"));
        assert!(html.contains("card failure-message"));
        assert!(html.contains("bg-warning text-bg-warning"));
        assert!(html.contains("Test failure message"));
        assert!(html.contains("expected: &quot;foo&quot;"));
    }

    #[test]
    fn test_actual_only_card() {
        let html = render(
            r#"{"status": "failed", "details": {"matcher_name": "BeValid",
                "actual": "\"<record>\""}}"#,
            &RenderOptions::default(),
        );
        assert!(!html.contains("card-group"));
        assert!(html.contains("<pre>&lt;record&gt;</pre>"));
        assert!(html.contains(">Actual<"));
    }

    #[test]
    fn test_exception_card() {
        let html = render(
            r#"{"status": "failed", "file_path": "./spec/a_spec.rb", "line_number": 21,
                "exception": {"class": "NoMethodError",
                "message": "undefined method `name' for nil"}}"#,
            &RenderOptions::default(),
        );

        assert!(html.contains("bg-danger text-bg-danger"));
        assert!(html.contains("Error in code"));
        assert!(html.contains("<strong>NoMethodError on line 21</strong>"));
        assert!(html.contains("<pre class=\"text-danger\">undefined method `name&#39; for nil</pre>"));
        assert!(!html.contains("failure-message"));
    }

    #[test]
    fn test_backtrace_card() {
        let html = render(
            r#"{"status": "failed", "file_path": "/work/app/spec/models/a_spec.rb",
                "exception": {"class": "RuntimeError", "message": "boom", "backtrace": [
                    "/work/app/lib/a.rb:1:in `a'",
                    "/opt/tools/lib/b.rb:2:in `b'",
                    "/work/app/lib/c.rb:3:in `c'"
                ]}}"#,
            &RenderOptions::default().with_max_backtrace_lines(2),
        );

        assert!(html.contains("card bg-dark"));
        assert!(html.contains("Backtrace:"));
        assert!(html.contains(
            "<span class=\"backtrace-line project\">→ lib/a.rb:1:in `a&#39;</span>"
        ));
        assert!(html.contains(
            "<span class=\"backtrace-line external\">  /opt/tools/lib/b.rb:2:in `b&#39;</span>"
        ));
        assert!(!html.contains("lib/c.rb"));
        assert!(html.contains("1 more frames omitted"));
    }

    #[test]
    fn test_debug_header() {
        let json = r#"{"status": "failed", "details": {"matcher_name": "RSpec::Matchers::BuiltIn::Eq",
            "diffable": true, "expected": "1", "actual": "2"}}"#;

        let html = render(json, &RenderOptions::default().with_debug(true));
        assert!(html.contains("<div class=\"debug-info\">"));
        assert!(html.contains("RSpec::Matchers::BuiltIn::Eq (Built-in Matcher)"));
        assert!(html.contains("effective: true"));

        let html = render(json, &RenderOptions::default());
        assert!(!html.contains("debug-info"));
    }

    #[test]
    fn test_document_includes_styles_once() {
        let blocks = vec!["<div>a</div>".to_string(), "<div>b</div>".to_string()];
        let document = render_document(&blocks);

        assert_eq!(document.matches("<style>").count(), 1);
        assert!(document.starts_with("<style>"));
        assert!(document.ends_with("<div>a</div>\n<div>b</div>"));
    }
}
