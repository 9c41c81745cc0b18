//! Grammar engine.
//!
//! A recursive-descent parser over the lexer's token stream. The root line
//! is classified once, then each block is parsed at an exact indentation:
//! - multi-line dicts and lists end at the first line indented less than
//!   their block, and fail on a line indented differently otherwise
//! - `::` starts a vector, inline on the same line or multi-line on the
//!   following lines two spaces deeper
//! - every value line ends in `consume_line`, which rejects leftovers

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

/// Maximum number of nested vectors in one document.
pub const MAX_NESTING: usize = 512;

/// Parse a complete document.
pub fn parse_document(source: &str) -> Result<Value> {
    Parser::new(source).parse_document()
}

/// Shape of the root value, decided from its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootShape {
    Scalar,
    EmptyList,
    EmptyDict,
    MultilineList,
    MultilineDict,
    InlineList,
    InlineDict,
}

impl RootShape {
    fn describe(self) -> &'static str {
        match self {
            RootShape::Scalar => "root scalar value",
            RootShape::EmptyList | RootShape::MultilineList => "root list",
            RootShape::EmptyDict | RootShape::MultilineDict => "root dict",
            RootShape::InlineList => "root inline list",
            RootShape::InlineDict => "root inline dict",
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            depth: 0,
        }
    }

    fn parse_document(mut self) -> Result<Value> {
        let first = self.lexer.peek()?;
        let (kind, indent, line) = (first.kind, first.indent, first.line);
        if kind == TokenKind::Eof {
            return Err(ParseError::EmptyDocument(line));
        }
        if indent != 0 {
            return Err(ParseError::RootIndented(line));
        }

        let shape = self.classify_root(kind, line)?;
        debug!("root on line {} is a {}", line, shape.describe());

        let value = match shape {
            RootShape::Scalar => self.parse_scalar(0)?,
            RootShape::EmptyList => {
                self.lexer.next_token()?;
                self.lexer.consume_line()?;
                Value::List(Vec::new())
            }
            RootShape::EmptyDict => {
                self.lexer.next_token()?;
                self.lexer.consume_line()?;
                Value::Dict(BTreeMap::new())
            }
            RootShape::MultilineList => self.parse_multiline_list(0)?,
            RootShape::MultilineDict => self.parse_multiline_dict(0)?,
            RootShape::InlineList => {
                let value = self.parse_inline_list()?;
                self.lexer.consume_line()?;
                value
            }
            RootShape::InlineDict => {
                let value = self.parse_inline_dict()?;
                self.lexer.consume_line()?;
                value
            }
        };

        let next = self.lexer.peek()?;
        if next.kind != TokenKind::Eof {
            return Err(ParseError::UnexpectedContentAfterRoot(
                next.line,
                shape.describe(),
            ));
        }
        Ok(value)
    }

    /// Decide the root shape from the first token and the rest of its line.
    fn classify_root(&self, kind: TokenKind, line: usize) -> Result<RootShape> {
        let rest = self.lexer.rest_of_line();
        let shape = match kind {
            TokenKind::ScalarIndicator => {
                return Err(ParseError::RootIndicatorNotAllowed(line, ":"))
            }
            TokenKind::VectorIndicator => {
                return Err(ParseError::RootIndicatorNotAllowed(line, "::"))
            }
            TokenKind::EmptyList => RootShape::EmptyList,
            TokenKind::EmptyDict => RootShape::EmptyDict,
            TokenKind::ListItem => RootShape::MultilineList,
            TokenKind::Key | TokenKind::QuotedKey => {
                if !rest.starts_with("::") && has_top_level_comma(rest) {
                    RootShape::InlineDict
                } else {
                    RootShape::MultilineDict
                }
            }
            _ if has_top_level_comma(rest) => RootShape::InlineList,
            _ => RootShape::Scalar,
        };
        Ok(shape)
    }

    // ========================================================================
    // Multi-line Blocks
    // ========================================================================

    fn parse_multiline_dict(&mut self, indent: usize) -> Result<Value> {
        let mut dict = BTreeMap::new();
        loop {
            let token = self.lexer.peek()?;
            if token.kind == TokenKind::Eof || token.indent < indent {
                break;
            }
            check_indent(token, indent)?;
            if !token.kind.is_key() {
                return Err(ParseError::ExpectedKey(token.line));
            }

            let key = self.lexer.next_token()?;
            let name = key.value.into_owned();
            if dict.contains_key(&name) {
                return Err(ParseError::DuplicateKey(key.line, name));
            }

            let indicator = self.lexer.next_token()?;
            let value = match indicator.kind {
                TokenKind::ScalarIndicator => {
                    self.lexer.expect_single_space("after ':'")?;
                    self.parse_scalar(indent)?
                }
                TokenKind::VectorIndicator => self.parse_vector(indent + 2)?,
                _ => return Err(ParseError::ExpectedIndicator(indicator.line)),
            };
            dict.insert(name, value);
        }
        Ok(Value::Dict(dict))
    }

    fn parse_multiline_list(&mut self, indent: usize) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            let token = self.lexer.peek()?;
            if token.kind == TokenKind::Eof || token.indent < indent {
                break;
            }
            check_indent(token, indent)?;
            if token.kind != TokenKind::ListItem {
                return Err(ParseError::ExpectedListItem(token.line));
            }

            self.lexer.next_token()?;
            self.lexer.reject_extra_space("after '-'")?;
            let value = if self.lexer.peek()?.kind == TokenKind::VectorIndicator {
                self.lexer.next_token()?;
                self.parse_vector(indent + 2)?
            } else {
                self.parse_scalar(indent)?
            };
            items.push(value);
        }
        Ok(Value::List(items))
    }

    /// Parse the value after `::`. Multi-line content sits at `indent`.
    fn parse_vector(&mut self, indent: usize) -> Result<Value> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::NestingTooDeep(
                self.lexer.line_num(),
                MAX_NESTING,
            ));
        }
        let value = self.parse_vector_body(indent);
        self.depth -= 1;
        value
    }

    fn parse_vector_body(&mut self, indent: usize) -> Result<Value> {
        if !self.lexer.at_end_of_line() {
            self.lexer.expect_single_space("after '::'")?;
            trace!("inline vector on line {}", self.lexer.line_num());
            return self.parse_inline_vector();
        }

        self.lexer.consume_line()?;
        let token = self.lexer.peek()?;
        if token.kind == TokenKind::Eof || token.indent < indent {
            return Err(ParseError::AmbiguousEmptyVector(token.line));
        }
        if token.kind == TokenKind::ListItem {
            trace!("multi-line list at indent {}", indent);
            self.parse_multiline_list(indent)
        } else {
            trace!("multi-line dict at indent {}", indent);
            self.parse_multiline_dict(indent)
        }
    }

    /// A scalar or multi-line string owned by a key or list item at
    /// `key_indent`, followed by the end of its line.
    fn parse_scalar(&mut self, key_indent: usize) -> Result<Value> {
        let token = self.lexer.next_token()?;
        if let TokenKind::BlockString(mode) = token.kind {
            return self
                .lexer
                .scan_block_string(mode, key_indent)
                .map(Value::String);
        }
        let value = token_value(token)?;
        self.lexer.consume_line()?;
        Ok(value)
    }

    // ========================================================================
    // Inline Collections
    // ========================================================================

    fn parse_inline_vector(&mut self) -> Result<Value> {
        let kind = self.lexer.peek()?.kind;
        let value = match kind {
            TokenKind::EmptyList => {
                self.lexer.next_token()?;
                Value::List(Vec::new())
            }
            TokenKind::EmptyDict => {
                self.lexer.next_token()?;
                Value::Dict(BTreeMap::new())
            }
            kind if kind.is_key() => self.parse_inline_dict()?,
            _ => self.parse_inline_list()?,
        };
        self.lexer.consume_line()?;
        Ok(value)
    }

    fn parse_inline_list(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            if !items.is_empty() {
                if self.lexer.at_end_of_line() {
                    break;
                }
                self.expect_comma()?;
            }
            let token = self.lexer.next_token()?;
            items.push(inline_value(token)?);
        }
        Ok(Value::List(items))
    }

    fn parse_inline_dict(&mut self) -> Result<Value> {
        let mut dict = BTreeMap::new();
        loop {
            if !dict.is_empty() {
                if self.lexer.at_end_of_line() {
                    break;
                }
                self.expect_comma()?;
            }

            let key = self.lexer.next_token()?;
            if !key.kind.is_key() {
                return Err(ParseError::ExpectedKey(key.line));
            }
            let name = key.value.into_owned();
            if dict.contains_key(&name) {
                return Err(ParseError::DuplicateKey(key.line, name));
            }

            let indicator = self.lexer.next_token()?;
            if indicator.kind != TokenKind::ScalarIndicator {
                return Err(ParseError::ExpectedScalarIndicator(indicator.line));
            }
            self.lexer.expect_single_space("in inline dict")?;

            let token = self.lexer.next_token()?;
            dict.insert(name, inline_value(token)?);
        }
        Ok(Value::Dict(dict))
    }

    /// `,` directly after the previous item, then exactly one space.
    fn expect_comma(&mut self) -> Result<()> {
        let token = self.lexer.next_token()?;
        if token.kind != TokenKind::Comma {
            return Err(ParseError::ExpectedComma(token.line));
        }
        if token.space_before {
            return Err(ParseError::SpaceBeforeComma(token.line));
        }
        self.lexer.expect_single_space("after comma")
    }
}

fn check_indent(token: &Token<'_>, expected: usize) -> Result<()> {
    if token.indent != expected {
        return Err(ParseError::BadIndent {
            line: token.line,
            found: token.indent,
            expected,
        });
    }
    Ok(())
}

/// Is there a comma outside quoted strings before any comment?
fn has_top_level_comma(text: &str) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b',' => return true,
                b'#' => return false,
                _ => {}
            }
        }
    }
    false
}

fn inline_value(token: Token<'_>) -> Result<Value> {
    if let TokenKind::BlockString(_) = token.kind {
        return Err(ParseError::MultilineStringNotAllowed(token.line));
    }
    token_value(token)
}

/// Convert a scalar token into a value.
fn token_value(token: Token<'_>) -> Result<Value> {
    let line = token.line;
    let value = match token.kind {
        TokenKind::String => Value::String(token.value.into_owned()),
        TokenKind::Int => Value::Int(parse_int(&token.value, line)?),
        TokenKind::Float => Value::Float(parse_float(&token.value, line)?),
        TokenKind::Bool => Value::Bool(token.value == "true"),
        TokenKind::Null => Value::Null,
        TokenKind::NaN => Value::Float(f64::NAN),
        TokenKind::Inf if token.value == "-" => Value::Float(f64::NEG_INFINITY),
        TokenKind::Inf => Value::Float(f64::INFINITY),
        TokenKind::Eof => return Err(ParseError::UnexpectedEnd(line)),
        _ => return Err(ParseError::UnexpectedToken(line, token.describe())),
    };
    Ok(value)
}

// ============================================================================
// Number Parsing
// ============================================================================

/// Parse an integer literal with optional sign, radix prefix and `_`
/// separators. The magnitude is read as `i128` so that `i64::MIN` is
/// reachable in every base.
fn parse_int(text: &str, line: usize) -> Result<i64> {
    let invalid = || ParseError::InvalidNumberLiteral(line, text.to_string());
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, unsigned) = match digits.as_bytes().first() {
        Some(b'-') => (true, &digits[1..]),
        Some(b'+') => (false, &digits[1..]),
        _ => (false, &digits[..]),
    };
    let (radix, body) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, &unsigned[2..]),
        Some("0o" | "0O") => (8, &unsigned[2..]),
        Some("0b" | "0B") => (2, &unsigned[2..]),
        _ => (10, unsigned),
    };
    let magnitude = i128::from_str_radix(body, radix).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| invalid())
}

fn parse_float(text: &str, line: usize) -> Result<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    digits
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumberLiteral(line, text.to_string()))
}
