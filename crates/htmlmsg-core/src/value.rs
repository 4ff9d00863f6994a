//! Decoded actual/expected values and the value codec
//!
//! Matchers report their actual and expected values as serialized text. The
//! codec turns that text back into a [`Value`] tree without ever instantiating
//! types named in the input: only scalars, arrays, and key/value mappings are
//! rebuilt. Object-mode markers written by the upstream serializer are
//! understood so that opaque instances keep their class name and reference
//! cycles survive as [`Value::Cycle`] markers.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Number};
use tracing::{debug, trace};

/// Key carrying the class name of a serialized instance
const CLASS_KEY: &str = "^o";

/// Key carrying the reference id of a serialized object
const ID_KEY: &str = "^i";

/// Prefix of an array's leading id element (`"^i3"`)
const ARRAY_ID_PREFIX: &str = "^i";

/// Prefix of a back-reference string (`"^r3"`)
const REF_PREFIX: &str = "^r";

/// Prefix of a serialized symbol (`":name"`)
const SYMBOL_PREFIX: char = ':';

/// Escape for strings that would otherwise look like markers
const ESCAPE_PREFIX: char = '~';

/// Upper bound on decoded nodes, counting every copy of a shared container
pub const MAX_DECODED_NODES: usize = 100_000;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of container a cycle points back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    Array,
    Mapping,
    /// Opaque instance with its class name
    Instance(String),
}

/// Back-reference to an enclosing container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRef {
    pub id: u64,
    pub kind: ContainerKind,
}

/// A decoded actual/expected value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No serialized value was supplied at all
    Absent,
    /// Decoded JSON `null`
    Nil,
    Bool(bool),
    Number(Number),
    Str(String),
    Symbol(String),
    Array(Vec<Value>),
    /// A key/value mapping; `class` is set for opaque instances
    Object {
        class: Option<String>,
        id: Option<u64>,
        fields: Vec<(String, Value)>,
    },
    /// Reference back to a container that is still being decoded
    Cycle(CycleRef),
}

impl Value {
    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    pub fn int(n: i64) -> Self {
        Value::Number(Number::from(n))
    }

    /// A plain mapping with fields in the given order
    pub fn mapping<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object {
            class: None,
            id: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Single-line textual form, used when pretty-printing is not possible
    pub fn to_plain_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent | Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", inspect_str(s)),
            Value::Symbol(name) => write!(f, "{}", inspect_symbol(name)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object {
                class: None,
                fields,
                ..
            } => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", inspect_str(key), value)?;
                }
                write!(f, "}}")
            }
            Value::Object {
                class: Some(class),
                fields,
                ..
            } => {
                write!(f, "#<{}", class)?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}@{}={}", sep, key, value)?;
                }
                write!(f, ">")
            }
            Value::Cycle(cycle) => write!(f, "{}", cycle_marker(&cycle.kind)),
        }
    }
}

/// Marker text printed in place of a recursive container
pub fn cycle_marker(kind: &ContainerKind) -> String {
    match kind {
        ContainerKind::Array => "[...]".to_string(),
        ContainerKind::Mapping => "{...}".to_string(),
        ContainerKind::Instance(class) => format!("#<{} ...>", class),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Codec
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a serialized actual/expected value.
///
/// - `None` yields [`Value::Absent`], which is distinct from a decoded `null`.
/// - Text that is not valid JSON comes back unchanged as [`Value::Str`].
///
/// - Input that would expand past [`MAX_DECODED_NODES`] through shared
///   references also comes back as raw text.
///
/// Decoding never fails and never executes anything named in the input.
pub fn decode(serialized: Option<&str>) -> Value {
    let Some(text) = serialized else {
        return Value::Absent;
    };

    let json = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => json,
        Err(e) => {
            debug!("Value is not JSON ({}), keeping raw text", e);
            return Value::Str(text.to_string());
        }
    };

    let mut decoder = Decoder::default();
    let value = decoder.decode(json);
    if decoder.exhausted {
        debug!(
            "Value expands past {} nodes, keeping raw text",
            MAX_DECODED_NODES
        );
        return Value::Str(text.to_string());
    }
    value
}

/// Tree walker that tracks reference ids while rebuilding values
#[derive(Debug, Default)]
struct Decoder {
    /// Containers currently being decoded, outermost first
    open: Vec<(u64, ContainerKind)>,

    /// Containers already decoded, by reference id, with their node count
    finished: HashMap<u64, (Value, usize)>,

    /// Nodes produced so far
    nodes: usize,

    /// Set once `nodes` passes [`MAX_DECODED_NODES`]; the result is discarded
    exhausted: bool,
}

impl Decoder {
    fn decode(&mut self, json: serde_json::Value) -> Value {
        if !self.charge(1) {
            return Value::Nil;
        }
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => self.decode_string(s),
            serde_json::Value::Array(items) => self.decode_array(items),
            serde_json::Value::Object(map) => self.decode_object(map),
        }
    }

    /// Account for `count` new nodes, returning false once over budget
    fn charge(&mut self, count: usize) -> bool {
        if self.exhausted {
            return false;
        }
        self.nodes = self.nodes.saturating_add(count);
        if self.nodes > MAX_DECODED_NODES {
            self.exhausted = true;
        }
        !self.exhausted
    }

    fn decode_string(&mut self, s: String) -> Value {
        if let Some(id) = s.strip_prefix(REF_PREFIX).and_then(parse_id) {
            if let Some((_, kind)) = self.open.iter().find(|(open_id, _)| *open_id == id) {
                trace!("Cycle back to container {}", id);
                return Value::Cycle(CycleRef {
                    id,
                    kind: kind.clone(),
                });
            }
            if let Some(size) = self.finished.get(&id).map(|(_, size)| *size) {
                if !self.charge(size) {
                    return Value::Nil;
                }
                return self
                    .finished
                    .get(&id)
                    .map(|(value, _)| value.clone())
                    .unwrap_or(Value::Nil);
            }
            return Value::Str(s);
        }

        if let Some(rest) = s.strip_prefix(ESCAPE_PREFIX) {
            if rest.starts_with([SYMBOL_PREFIX, '^', ESCAPE_PREFIX]) {
                return Value::Str(rest.to_string());
            }
        }

        match s.strip_prefix(SYMBOL_PREFIX) {
            Some(name) if !name.is_empty() => Value::Symbol(name.to_string()),
            _ => Value::Str(s),
        }
    }

    fn decode_array(&mut self, items: Vec<serde_json::Value>) -> Value {
        let mut items = items.into_iter().peekable();
        let id = match items.peek() {
            Some(serde_json::Value::String(s)) => s.strip_prefix(ARRAY_ID_PREFIX).and_then(parse_id),
            _ => None,
        };
        if id.is_some() {
            items.next();
        }

        self.within(id, ContainerKind::Array, |decoder| {
            Value::Array(items.map(|item| decoder.decode(item)).collect())
        })
    }

    fn decode_object(&mut self, map: Map<String, serde_json::Value>) -> Value {
        let class = map
            .get(CLASS_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let id = map.get(ID_KEY).and_then(|v| v.as_u64());
        let kind = match &class {
            Some(name) => ContainerKind::Instance(name.clone()),
            None => ContainerKind::Mapping,
        };

        self.within(id, kind, |decoder| {
            let fields = map
                .into_iter()
                .filter(|(key, _)| {
                    !(key == CLASS_KEY && class.is_some() || key == ID_KEY && id.is_some())
                })
                .map(|(key, value)| {
                    let key = match (&class, key.strip_prefix(ESCAPE_PREFIX)) {
                        (Some(_), Some(stripped)) => stripped.to_string(),
                        _ => key,
                    };
                    (key, decoder.decode(value))
                })
                .collect();

            Value::Object { class, id, fields }
        })
    }

    /// Decode a container, registering its id while its children are decoded
    fn within(
        &mut self,
        id: Option<u64>,
        kind: ContainerKind,
        build: impl FnOnce(&mut Self) -> Value,
    ) -> Value {
        if let Some(id) = id {
            self.open.push((id, kind));
        }

        let start = self.nodes;
        let value = build(self);

        if let Some(id) = id {
            self.open.pop();
            if !self.exhausted {
                // Includes the container node itself, charged by the caller
                let size = self.nodes - start + 1;
                self.finished.insert(id, (value.clone(), size));
            }
        }
        value
    }
}

fn parse_id(digits: &str) -> Option<u64> {
    digits.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Inspect helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Quote and escape a string the way Ruby's `String#inspect` does
pub fn inspect_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            '#' if matches!(chars.peek(), Some('{' | '$' | '@')) => out.push_str("\\#"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }

    out.push('"');
    out
}

/// Render a symbol name, quoting it when it is not a plain identifier
pub fn inspect_symbol(name: &str) -> String {
    let body = name.strip_suffix(['?', '!', '=']).unwrap_or(name);
    let mut chars = body.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');

    if plain {
        format!(":{}", name)
    } else {
        format!(":{}", inspect_str(name))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
