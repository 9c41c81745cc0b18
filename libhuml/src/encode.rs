//! Encode values as HUML text.
//!
//! Output is canonical: dict keys in byte order, one entry per line, nested
//! vectors on fresh lines two spaces deeper, and empty collections as `[]` or
//! `{}`. Everything the encoder writes parses back to an equal value.

use std::collections::BTreeMap;

use log::debug;

use crate::error::EncodeError;
use crate::parser::MAX_NESTING;
use crate::value::Value;
use crate::SUPPORTED_VERSION;

/// Options for [`encode_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Start the output with a `%HUML` version directive.
    pub version_header: bool,
    /// Deepest allowed nesting of vectors below the root collection,
    /// counted the way the parser counts it.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version_header: true,
            max_depth: MAX_NESTING,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit the `%HUML` directive.
    pub fn without_version_header(mut self) -> Self {
        self.version_header = false;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Encode a value with the default options.
///
/// # Example
///
/// ```
/// use libhuml::{encode, Value};
///
/// let text = encode(&Value::from(vec![1, 2])).unwrap();
/// assert_eq!(text, "%HUML v0.2.0\n- 1\n- 2\n");
/// ```
pub fn encode(value: &Value) -> Result<String, EncodeError> {
    encode_with(value, &EncodeOptions::default())
}

/// Encode a value with explicit options.
pub fn encode_with(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    let mut writer = HumlWriter {
        out: String::new(),
        max_depth: options.max_depth,
    };
    if options.version_header {
        writer.out.push_str("%HUML ");
        writer.out.push_str(SUPPORTED_VERSION);
        writer.out.push('\n');
    }
    writer.write_root(value)?;
    debug!(
        "encoded {} as {} bytes",
        value.kind_name(),
        writer.out.len()
    );
    Ok(writer.out)
}

struct HumlWriter {
    out: String,
    max_depth: usize,
}

impl HumlWriter {
    fn write_root(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Dict(dict) if !dict.is_empty() => self.write_dict(dict, 0, 0),
            Value::List(items) if !items.is_empty() => self.write_list(items, 0, 0),
            _ => {
                self.write_inline(value, 0);
                self.out.push('\n');
                Ok(())
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), EncodeError> {
        if depth > self.max_depth {
            return Err(EncodeError::DepthLimitExceeded(self.max_depth));
        }
        Ok(())
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn write_dict(
        &mut self,
        dict: &BTreeMap<String, Value>,
        indent: usize,
        depth: usize,
    ) -> Result<(), EncodeError> {
        for (key, value) in dict {
            self.pad(indent);
            write_key(&mut self.out, key);
            self.write_member(value, indent, depth, ": ", "::")?;
        }
        Ok(())
    }

    fn write_list(&mut self, items: &[Value], indent: usize, depth: usize) -> Result<(), EncodeError> {
        for item in items {
            self.pad(indent);
            self.write_member(item, indent, depth, "- ", "- ::")?;
        }
        Ok(())
    }

    /// Write what follows a key (or the list marker) through the end of the
    /// entry, including any nested block.
    fn write_member(
        &mut self,
        value: &Value,
        indent: usize,
        depth: usize,
        scalar_prefix: &str,
        vector_prefix: &str,
    ) -> Result<(), EncodeError> {
        if matches!(value, Value::Dict(_) | Value::List(_)) {
            self.check_depth(depth + 1)?;
        }
        match value {
            Value::Dict(dict) if !dict.is_empty() => {
                self.out.push_str(vector_prefix);
                self.out.push('\n');
                self.write_dict(dict, indent + 2, depth + 1)
            }
            Value::List(items) if !items.is_empty() => {
                self.out.push_str(vector_prefix);
                self.out.push('\n');
                self.write_list(items, indent + 2, depth + 1)
            }
            Value::Dict(_) | Value::List(_) => {
                self.out.push_str(vector_prefix);
                self.out.push(' ');
                self.write_inline(value, indent);
                self.out.push('\n');
                Ok(())
            }
            _ => {
                self.out.push_str(scalar_prefix);
                self.write_inline(value, indent);
                self.out.push('\n');
                Ok(())
            }
        }
    }

    /// Write a scalar or an empty collection. `key_indent` places the lines
    /// of a multi-line string.
    fn write_inline(&mut self, value: &Value, key_indent: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(true) => self.out.push_str("true"),
            Value::Bool(false) => self.out.push_str("false"),
            Value::Int(n) => self.out.push_str(&n.to_string()),
            Value::Float(f) => self.out.push_str(&format_float(*f)),
            Value::String(s) if s.contains('\n') => self.write_block_string(s, key_indent),
            Value::String(s) => write_quoted(&mut self.out, s),
            Value::List(_) => self.out.push_str("[]"),
            Value::Dict(_) => self.out.push_str("{}"),
        }
    }

    /// Preserve-mode block: content two spaces past the key, closing
    /// delimiter level with the key. Empty lines carry no indentation.
    fn write_block_string(&mut self, s: &str, key_indent: usize) {
        self.out.push_str("```\n");
        for line in s.split('\n') {
            if !line.is_empty() {
                self.pad(key_indent + 2);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
        self.pad(key_indent);
        self.out.push_str("```");
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f == f64::INFINITY {
        "inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        // Debug keeps a `.0` or exponent, so the literal reads back as a float.
        format!("{:?}", f)
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_key(out: &mut String, key: &str) {
    let bare = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if bare {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(value: &Value) -> String {
        encode_with(value, &EncodeOptions::new().without_version_header()).unwrap()
    }

    fn dict(entries: Vec<(&str, Value)>) -> Value {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_scenario_sorted_with_header() {
        let value = dict(vec![
            ("name", Value::from("Alice")),
            ("age", Value::from(30)),
            ("active", Value::from(true)),
        ]);
        assert_eq!(
            encode(&value).unwrap(),
            "%HUML v0.2.0\nactive: true\nage: 30\nname: \"Alice\"\n"
        );
    }

    #[test]
    fn test_root_scalars() {
        assert_eq!(bare(&Value::Null), "null\n");
        assert_eq!(bare(&Value::Int(-5)), "-5\n");
        assert_eq!(bare(&Value::List(vec![])), "[]\n");
        assert_eq!(bare(&Value::Dict(BTreeMap::new())), "{}\n");
    }

    #[test]
    fn test_floats() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(1e100), "1e100");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_nested() {
        let value = dict(vec![
            ("list", Value::from(vec![Value::from(1), Value::from(vec![2])])),
            ("empty", Value::List(vec![])),
            ("inner", dict(vec![("x", Value::Dict(BTreeMap::new()))])),
            ("items", Value::from(vec![Value::List(vec![]), Value::Dict(BTreeMap::new())])),
        ]);
        assert_eq!(
            bare(&value),
            "\
empty:: []
inner::
  x:: {}
items::
  - :: []
  - :: {}
list::
  - 1
  - ::
    - 2
"
        );
    }

    #[test]
    fn test_keys_quoted_when_needed() {
        let value = dict(vec![
            ("plain-key_1", Value::Null),
            ("with space", Value::Null),
            ("", Value::Null),
        ]);
        assert_eq!(
            bare(&value),
            "\"\": null\nplain-key_1: null\n\"with space\": null\n"
        );
    }

    #[test]
    fn test_string_escapes() {
        let value = Value::from("a\"b\\c\t\r\u{8}\u{c}\u{1}/é");
        assert_eq!(bare(&value), "\"a\\\"b\\\\c\\t\\r\\b\\f\\u0001/é\"\n");
    }

    #[test]
    fn test_block_string() {
        let value = dict(vec![(
            "text",
            Value::from(vec![Value::from("line one\n  indented\n\nlast\n")]),
        )]);
        assert_eq!(
            bare(&value),
            "text::\n  - ```\n    line one\n      indented\n\n    last\n\n  ```\n"
        );
    }

    #[test]
    fn test_depth_limit() {
        let value = Value::from(vec![Value::from(vec![Value::from(vec![1])])]);
        assert!(encode_with(&value, &EncodeOptions::new().max_depth(2)).is_ok());
        assert_eq!(
            encode_with(&value, &EncodeOptions::new().max_depth(1)),
            Err(EncodeError::DepthLimitExceeded(1))
        );
        let empty = Value::from(vec![Value::List(vec![])]);
        assert!(encode_with(&empty, &EncodeOptions::new().max_depth(1)).is_ok());
        assert_eq!(
            encode_with(&empty, &EncodeOptions::new().max_depth(0)),
            Err(EncodeError::DepthLimitExceeded(0))
        );
        assert_eq!(EncodeOptions::default().max_depth, MAX_NESTING);
    }
}
