//! Stylesheet for rendered sections

const DIFF_CSS: &str = r#".diff {
  overflow: auto;
}
.diff ul {
  background: #fff;
  overflow: auto;
  font-size: 13px;
  list-style: none;
  margin: 0;
  padding: 0;
  display: table;
  width: 100%;
}
.diff del, .diff ins {
  display: block;
  text-decoration: none;
}
.diff li {
  padding: 0;
  display: table-row;
  margin: 0;
  height: 1em;
}
.diff li.ins {
  background: #dfd;
  color: #080;
}
.diff li.del {
  background: #fee;
  color: #b00;
}
.diff li:hover {
  background: #ffc;
}
.diff del, .diff ins, .diff span {
  white-space: pre-wrap;
  font-family: courier;
}
"#;

const SECTION_CSS: &str = r#".rspec-html-messages .card {
  margin-bottom: 0.75rem;
}
.rspec-html-messages pre {
  margin: 0;
  white-space: pre-wrap;
}
.rspec-html-messages .backtrace-line.project {
  font-weight: bold;
}
.rspec-html-messages .frames-omitted {
  opacity: 0.7;
}
.rspec-html-messages .debug-info {
  font-size: 0.8rem;
  margin-bottom: 0.5rem;
}
"#;

/// Styles for the side-by-side diff columns
pub fn diff_css() -> &'static str {
    DIFF_CSS
}

/// Full stylesheet, wrapped in a `<style>` element
pub fn style_block() -> String {
    format!("<style>\n{}{}</style>", DIFF_CSS, SECTION_CSS)
}
