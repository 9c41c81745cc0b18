//! HUML (Human-oriented Markup Language) parser and encoder.
//!
//! HUML is an indentation-based data format with strict, unambiguous
//! spacing: one space after every indicator and comma, no trailing
//! whitespace, and explicit `[]`/`{}` markers for empty collections.
//!
//! # Parsing Pipeline
//!
//! The parser operates in three phases:
//!
//! 1. **Scanner**: Splits source text into lines, measuring indentation and
//!    rejecting trailing spaces and tab indentation.
//!
//! 2. **Lexer**: Converts lines into typed tokens (keys, indicators, scalars,
//!    markers) with one token of lookahead.
//!
//! 3. **Parser**: Classifies the root and recursively parses dicts, lists and
//!    scalars at exact indentation levels into a [`Value`].
//!
//! The [`encode`] direction writes a [`Value`] back out in canonical form,
//! with dict keys sorted so output is deterministic.

mod encode;
mod error;
mod lexer;
mod parser;
mod scanner;
mod stream;
mod value;

use log::debug;

pub use encode::{encode, encode_with, EncodeOptions};
pub use error::{EncodeError, Error, ErrorKind, ParseError, Result};
pub use parser::MAX_NESTING;
pub use stream::{Decoder, Encoder};
pub use value::Value;

/// The HUML version accepted in a `%HUML` directive and written by the encoder.
pub const SUPPORTED_VERSION: &str = "v0.2.0";

/// Parse a HUML document from a string.
///
/// # Example
///
/// ```
/// use libhuml::{parse, Value};
///
/// let value = parse("name: \"Alice\"\nage: 30\n").unwrap();
/// assert_eq!(value.get("age"), Some(&Value::Int(30)));
/// ```
pub fn parse(input: &str) -> Result<Value> {
    debug!("parsing {} bytes", input.len());
    parser::parse_document(input)
}

/// Parse a HUML document from bytes, which must be UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Value> {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse(text),
        Err(err) => {
            let valid = &bytes[..err.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Err(ParseError::InvalidUtf8(line))
        }
    }
}
