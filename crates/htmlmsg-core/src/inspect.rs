//! Structured pretty-printer for decoded values
//!
//! The [`PrettyPrinter`] trait is the seam between the value formatter, which
//! decides *policy* ([`PrettyOptions`]), and the traversal that produces
//! multi-line text. [`InspectPrinter`] is the default implementation and
//! prints values the way Ruby's `inspect` family does, so diffs read like the
//! failure messages they accompany.

use crate::error::{Error, Result};
use crate::value::{cycle_marker, inspect_str, inspect_symbol, Value};

/// Default nesting limit before printing gives up
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Printing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Sort mapping keys and instance fields
    pub sort_keys: bool,

    /// Prefix array elements with their index (`[0] "a"`)
    pub index: bool,

    /// Indent width per level; negative values left-align mapping keys
    pub indent: i32,

    /// Show object reference ids on instances that carry one
    pub object_id: bool,

    /// Show instance fields of opaque objects
    pub raw: bool,

    /// Nesting depth at which printing fails
    pub max_depth: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            sort_keys: false,
            index: true,
            indent: 4,
            object_id: true,
            raw: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Turns a decoded value into stable multi-line text
#[cfg_attr(any(test, feature = "test-helpers"), mockall::automock)]
pub trait PrettyPrinter {
    fn pretty(&self, value: &Value, options: &PrettyOptions) -> Result<String>;
}

/// Ruby-inspect style printer
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectPrinter;

impl PrettyPrinter for InspectPrinter {
    fn pretty(&self, value: &Value, options: &PrettyOptions) -> Result<String> {
        let mut writer = Writer {
            options,
            width: options.indent.unsigned_abs() as usize,
            out: String::new(),
        };
        writer.write(value, 0)?;
        Ok(writer.out)
    }
}

/// Accumulates output for one `pretty` call
struct Writer<'a> {
    options: &'a PrettyOptions,
    width: usize,
    out: String,
}

impl Writer<'_> {
    fn write(&mut self, value: &Value, level: usize) -> Result<()> {
        if level > self.options.max_depth {
            return Err(Error::format(format!(
                "value nests deeper than {} levels",
                self.options.max_depth
            )));
        }

        match value {
            Value::Absent | Value::Nil => self.out.push_str("nil"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.out.push_str(&n.to_string()),
            Value::Str(s) => self.out.push_str(&inspect_str(s)),
            Value::Symbol(name) => self.out.push_str(&inspect_symbol(name)),
            Value::Array(items) => self.write_array(items, level)?,
            Value::Object {
                class: None,
                fields,
                ..
            } => {
                let entries: Vec<(String, &Value)> = fields
                    .iter()
                    .map(|(key, value)| (inspect_str(key), value))
                    .collect();
                self.write_entries("{", "}", entries, level)?;
            }
            Value::Object {
                class: Some(class),
                id,
                fields,
            } => {
                let mut open = format!("#<{}", class);
                if let (true, Some(id)) = (self.options.object_id, id) {
                    open.push_str(&format!(":0x{:016x}", id));
                }

                if !self.options.raw || fields.is_empty() {
                    self.out.push_str(&open);
                    self.out.push('>');
                } else {
                    let entries: Vec<(String, &Value)> = fields
                        .iter()
                        .map(|(key, value)| (format!("@{}", key), value))
                        .collect();
                    self.write_entries(&open, ">", entries, level)?;
                }
            }
            Value::Cycle(cycle) => self.out.push_str(&cycle_marker(&cycle.kind)),
        }
        Ok(())
    }

    fn write_array(&mut self, items: &[Value], level: usize) -> Result<()> {
        if items.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }

        let digits = (items.len() - 1).to_string().len();
        self.out.push_str("[\n");
        for (i, item) in items.iter().enumerate() {
            self.pad(level + 1);
            if self.options.index {
                self.out.push_str(&format!("[{:>digits$}] ", i, digits = digits));
            }
            self.write(item, level + 1)?;
            if i + 1 < items.len() {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.pad(level);
        self.out.push(']');
        Ok(())
    }

    /// Write `label => value` lines with aligned separators
    fn write_entries(
        &mut self,
        open: &str,
        close: &str,
        mut entries: Vec<(String, &Value)>,
        level: usize,
    ) -> Result<()> {
        if entries.is_empty() {
            self.out.push_str(open);
            self.out.push_str(close);
            return Ok(());
        }

        if self.options.sort_keys {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let label_width = entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        let separator = if open == "{" { "=>" } else { "=" };

        self.out.push_str(open);
        self.out.push('\n');
        let count = entries.len();
        for (i, (label, value)) in entries.into_iter().enumerate() {
            self.pad(level + 1);
            let label = if self.options.indent < 0 {
                format!("{:<width$}", label, width = label_width)
            } else {
                format!("{:>width$}", label, width = label_width)
            };
            self.out.push_str(&label);
            self.out.push(' ');
            self.out.push_str(separator);
            self.out.push(' ');
            self.write(value, level + 1)?;
            if i + 1 < count {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.pad(level);
        self.out.push_str(close);
        Ok(())
    }

    fn pad(&mut self, level: usize) {
        self.out.push_str(&" ".repeat(self.width * level));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
