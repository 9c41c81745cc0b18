//! Token lexer.
//!
//! The lexer turns scanner lines into typed tokens with one token of
//! lookahead. HUML's spacing rules live *between* tokens, so the lexer also
//! exposes a handful of line-scoped cursor operations that the parser drives
//! directly:
//! - `expect_single_space` after `:`, `::` and `,`
//! - `at_end_of_line` and `consume_line` for line termination
//! - `rest_of_line` for classifying a line without moving the cursor
//! - `scan_block_string` for multi-line strings
//!
//! The cursor operations work on the raw line and must only be called while
//! no token is buffered.

use std::borrow::Cow;

use log::trace;

use crate::error::{ParseError, Result};
use crate::scanner::{validate_line, Scanner};
use crate::SUPPORTED_VERSION;

/// How a multi-line string treats the indentation of its content lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// `"""`: every content line is trimmed.
    Strip,
    /// ```` ``` ````: two spaces past the key are removed, the rest is kept.
    Preserve,
}

impl BlockMode {
    pub fn delimiter(self) -> &'static str {
        match self {
            BlockMode::Strip => "\"\"\"",
            BlockMode::Preserve => "```",
        }
    }
}

/// Token type in the lexer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    /// Bare word followed by `:` or `::`.
    Key,
    /// Quoted string followed by `:` or `::`.
    QuotedKey,
    /// `:`
    ScalarIndicator,
    /// `::`
    VectorIndicator,
    String,
    Int,
    Float,
    Bool,
    Null,
    NaN,
    /// Value holds the sign, if any.
    Inf,
    /// `[]`
    EmptyList,
    /// `{}`
    EmptyDict,
    /// `- ` at the start of a line.
    ListItem,
    Comma,
    /// Opening delimiter of a multi-line string.
    BlockString(BlockMode),
}

impl TokenKind {
    pub fn is_key(self) -> bool {
        matches!(self, TokenKind::Key | TokenKind::QuotedKey)
    }

    fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Key => "key",
            TokenKind::QuotedKey => "quoted key",
            TokenKind::ScalarIndicator => "':'",
            TokenKind::VectorIndicator => "'::'",
            TokenKind::String => "string",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Bool => "boolean",
            TokenKind::Null => "null",
            TokenKind::NaN => "nan",
            TokenKind::Inf => "inf",
            TokenKind::EmptyList => "'[]'",
            TokenKind::EmptyDict => "'{}'",
            TokenKind::ListItem => "list item",
            TokenKind::Comma => "','",
            TokenKind::BlockString(_) => "multiline string",
        }
    }
}

/// A single token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text, or the unescaped content for quoted strings and keys.
    pub value: Cow<'a, str>,
    /// One-based line.
    pub line: usize,
    /// Zero-based byte column.
    pub column: usize,
    /// Indentation of the token's line.
    pub indent: usize,
    /// Whether spaces separated this token from the previous one.
    pub space_before: bool,
}

impl Token<'_> {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        if self.kind.is_key() {
            format!("key '{}' at column {}", self.value, self.column + 1)
        } else {
            format!("{} at column {}", self.kind.name(), self.column + 1)
        }
    }
}

pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    /// Current line, `None` once consumed.
    line: Option<&'a str>,
    line_num: usize,
    pos: usize,
    indent: usize,
    lookahead: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            line: None,
            line_num: 0,
            pos: 0,
            indent: 0,
            lookahead: None,
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Return the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token<'a>> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        Ok(self.lookahead.insert(token))
    }

    /// Current one-based line number.
    pub fn line_num(&self) -> usize {
        self.line_num.max(1)
    }

    /// Unconsumed text of the current line, empty once the line is consumed.
    pub fn rest_of_line(&self) -> &'a str {
        self.line.map_or("", |line| &line[self.pos..])
    }

    /// True when only spaces and an optional comment remain on the line.
    pub fn at_end_of_line(&self) -> bool {
        let rest = self.rest_of_line().trim_start_matches(' ');
        rest.is_empty() || rest.starts_with('#')
    }

    /// Consume exactly one space.
    pub fn expect_single_space(&mut self, context: &'static str) -> Result<()> {
        debug_assert!(self.lookahead.is_none());
        match count_spaces(self.rest_of_line()) {
            0 => Err(ParseError::ExpectedSingleSpace(self.line_num, context)),
            1 => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(ParseError::MultipleSpaces(self.line_num, context)),
        }
    }

    /// Fail if a space follows the cursor.
    pub fn reject_extra_space(&self, context: &'static str) -> Result<()> {
        if self.rest_of_line().starts_with(' ') {
            return Err(ParseError::MultipleSpaces(self.line_num, context));
        }
        Ok(())
    }

    /// Validate that the remainder of the line is empty or a comment, then
    /// move past it.
    pub fn consume_line(&mut self) -> Result<()> {
        debug_assert!(self.lookahead.is_none());
        let Some(line) = self.line else {
            return Ok(());
        };
        let rest = &line[self.pos..];
        let content = rest.trim_start_matches(' ');
        let spaces = rest.len() - content.len();
        if content.is_empty() {
            if spaces > 0 {
                return Err(ParseError::TrailingWhitespace(self.line_num));
            }
        } else if content.starts_with('#') {
            match spaces {
                0 => return Err(ParseError::MissingSpaceBeforeComment(self.line_num)),
                1 => check_comment(line, self.pos + 1, self.line_num)?,
                _ => return Err(ParseError::MultipleSpaces(self.line_num, "before comment")),
            }
        } else {
            return Err(ParseError::UnexpectedTrailingContent(self.line_num));
        }
        self.line = None;
        Ok(())
    }

    /// Read a multi-line string whose opening delimiter was just consumed.
    ///
    /// Content runs until a line indented exactly `key_indent` that starts
    /// with the same delimiter. Content lines are not subject to the
    /// trailing-space rule.
    pub fn scan_block_string(&mut self, mode: BlockMode, key_indent: usize) -> Result<String> {
        debug_assert!(self.lookahead.is_none());
        let open_line = self.line_num;
        self.consume_line()?;

        let delimiter = mode.delimiter();
        let strip = key_indent + 2;
        let mut out = String::new();
        loop {
            let Some(line) = self.scanner.next_line() else {
                return Err(ParseError::UnterminatedMultilineString(open_line));
            };
            self.line_num = line.line_num;

            if line.indent == key_indent && line.content().starts_with(delimiter) {
                validate_line(&line)?;
                self.line = Some(line.text);
                self.indent = line.indent;
                self.pos = line.indent + delimiter.len();
                self.consume_line()?;
                break;
            }

            let text = match mode {
                BlockMode::Preserve if line.indent >= strip => &line.text[strip..],
                BlockMode::Preserve => line.text,
                BlockMode::Strip => line.text.trim(),
            };
            out.push_str(text);
            out.push('\n');
        }
        out.pop();
        trace!(
            "multiline string on lines {}..={}: {} bytes",
            open_line,
            self.line_num,
            out.len()
        );
        Ok(out)
    }

    // ========================================================================
    // Token scanning
    // ========================================================================

    fn scan(&mut self) -> Result<Token<'a>> {
        let mut space_before = false;
        loop {
            let Some(line) = self.line else {
                if !self.advance_line()? {
                    return Ok(self.eof_token());
                }
                space_before = false;
                continue;
            };

            if self.line_num == 1 && self.pos == 0 && line.starts_with("%HUML") {
                self.scan_version(line)?;
                continue;
            }

            let skipped = count_spaces(&line[self.pos..]);
            if skipped > 0 {
                space_before = true;
                self.pos += skipped;
            }
            match line.as_bytes().get(self.pos) {
                None => self.line = None,
                Some(b'#') if self.pos == self.indent => {
                    check_comment(line, self.pos, self.line_num)?;
                    self.line = None;
                }
                Some(b'#') => return Err(ParseError::UnexpectedCharacter(self.line_num, '#')),
                Some(_) => return self.scan_token(line, space_before),
            }
        }
    }

    fn advance_line(&mut self) -> Result<bool> {
        let Some(line) = self.scanner.next_line() else {
            return Ok(false);
        };
        self.line_num = line.line_num;
        validate_line(&line)?;
        self.line = Some(line.text);
        self.indent = line.indent;
        self.pos = line.indent;
        Ok(true)
    }

    fn eof_token(&self) -> Token<'a> {
        Token {
            kind: TokenKind::Eof,
            value: Cow::Borrowed(""),
            line: self.line_num.max(1),
            column: 0,
            indent: 0,
            space_before: false,
        }
    }

    fn scan_version(&mut self, line: &'a str) -> Result<()> {
        self.pos = "%HUML".len();
        if let Some(rest) = line[self.pos..].strip_prefix(' ') {
            let version = rest.split(' ').next().unwrap_or_default();
            if !version.is_empty() && !version.starts_with('#') {
                if version != SUPPORTED_VERSION {
                    return Err(ParseError::UnsupportedVersion(
                        self.line_num,
                        version.to_string(),
                    ));
                }
                self.pos += 1 + version.len();
            }
        }
        trace!("version directive: {}", line);
        self.consume_line()
    }

    fn token(
        &self,
        kind: TokenKind,
        value: impl Into<Cow<'a, str>>,
        column: usize,
        space_before: bool,
    ) -> Token<'a> {
        Token {
            kind,
            value: value.into(),
            line: self.line_num,
            column,
            indent: self.indent,
            space_before,
        }
    }

    fn scan_token(&mut self, line: &'a str, space_before: bool) -> Result<Token<'a>> {
        let bytes = line.as_bytes();
        let start = self.pos;
        let rest = &line[start..];

        let (kind, len) = match bytes[start] {
            b'-' if start == self.indent && bytes.get(start + 1) == Some(&b' ') => {
                (TokenKind::ListItem, 2)
            }
            b'[' if rest.starts_with("[]") => (TokenKind::EmptyList, 2),
            b'{' if rest.starts_with("{}") => (TokenKind::EmptyDict, 2),
            b'"' if rest.starts_with("\"\"\"") => (TokenKind::BlockString(BlockMode::Strip), 3),
            b'`' if rest.starts_with("```") => (TokenKind::BlockString(BlockMode::Preserve), 3),
            b'"' => return self.scan_quoted(line, space_before),
            b':' if rest.starts_with("::") => (TokenKind::VectorIndicator, 2),
            b':' => (TokenKind::ScalarIndicator, 1),
            b',' => (TokenKind::Comma, 1),
            b'+' => return self.scan_number(line, space_before),
            b if is_key_byte(b) => return self.scan_word(line, space_before),
            _ => {
                let ch = rest.chars().next().unwrap_or_default();
                return Err(ParseError::UnexpectedCharacter(self.line_num, ch));
            }
        };
        self.pos += len;
        Ok(self.token(kind, &line[start..start + len], start, space_before))
    }

    /// Is the text at `end` an indicator? Spaces before it are an error.
    fn indicator_follows(&self, line: &str, end: usize) -> Result<bool> {
        let after = &line[end..];
        let trimmed = after.trim_start_matches(' ');
        if !trimmed.starts_with(':') {
            return Ok(false);
        }
        if trimmed.len() != after.len() {
            return Err(ParseError::SpaceBeforeIndicator(self.line_num));
        }
        Ok(true)
    }

    /// A run of key characters: key, keyword or number.
    fn scan_word(&mut self, line: &'a str, space_before: bool) -> Result<Token<'a>> {
        let start = self.pos;
        let end = start + line[start..].bytes().take_while(|&b| is_key_byte(b)).count();
        let word = &line[start..end];

        if self.indicator_follows(line, end)? {
            self.pos = end;
            return Ok(self.token(TokenKind::Key, word, start, space_before));
        }

        if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return self.scan_number(line, space_before);
        }

        let kind = match word {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            "nan" => TokenKind::NaN,
            "inf" => TokenKind::Inf,
            _ => return Err(ParseError::UnquotedString(self.line_num, word.to_string())),
        };
        self.pos = end;
        Ok(self.token(kind, word, start, space_before))
    }

    fn scan_number(&mut self, line: &'a str, space_before: bool) -> Result<Token<'a>> {
        let bytes = line.as_bytes();
        let start = self.pos;
        let line_num = self.line_num;
        let invalid =
            || ParseError::InvalidNumberLiteral(line_num, literal_at(line, start).to_string());

        let mut pos = start;
        if matches!(bytes[pos], b'+' | b'-') {
            pos += 1;
            if line[pos..].starts_with("inf") && !bytes.get(pos + 3).is_some_and(|&b| is_key_byte(b))
            {
                self.pos = pos + 3;
                return Ok(self.token(TokenKind::Inf, &line[start..pos], start, space_before));
            }
        }
        if !bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let radix_digit: Option<fn(u8) -> bool> = match (bytes[pos], bytes.get(pos + 1)) {
            (b'0', Some(b'x' | b'X')) => Some(is_hex_digit as fn(u8) -> bool),
            (b'0', Some(b'o' | b'O')) => Some(is_octal_digit as fn(u8) -> bool),
            (b'0', Some(b'b' | b'B')) => Some(is_binary_digit as fn(u8) -> bool),
            _ => None,
        };

        let mut kind = TokenKind::Int;
        if let Some(is_digit) = radix_digit {
            pos += 2;
            let digits = line[pos..]
                .bytes()
                .take_while(|&b| is_digit(b) || b == b'_')
                .count();
            if digits == 0 {
                return Err(invalid());
            }
            pos += digits;
        } else {
            while let Some(&b) = bytes.get(pos) {
                match b {
                    b'0'..=b'9' | b'_' => {}
                    b'.' => kind = TokenKind::Float,
                    b'e' | b'E' => {
                        kind = TokenKind::Float;
                        if matches!(bytes.get(pos + 1), Some(b'+' | b'-')) {
                            pos += 1;
                        }
                    }
                    _ => break,
                }
                pos += 1;
            }
        }

        if bytes.get(pos).is_some_and(|&b| is_key_byte(b) || b == b'.') {
            return Err(invalid());
        }
        self.pos = pos;
        Ok(self.token(kind, &line[start..pos], start, space_before))
    }

    fn scan_quoted(&mut self, line: &'a str, space_before: bool) -> Result<Token<'a>> {
        let start = self.pos;
        let (value, end) = read_quoted(line, start + 1, self.line_num)?;
        let kind = if self.indicator_follows(line, end)? {
            TokenKind::QuotedKey
        } else {
            TokenKind::String
        };
        self.pos = end;
        Ok(self.token(kind, value, start, space_before))
    }
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn is_octal_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

fn is_binary_digit(b: u8) -> bool {
    b == b'0' || b == b'1'
}

fn count_spaces(text: &str) -> usize {
    text.bytes().take_while(|&b| b == b' ').count()
}

/// The literal starting at `start`, up to the next space or comma.
fn literal_at(line: &str, start: usize) -> &str {
    let rest = &line[start..];
    let end = rest.find(|c: char| c == ' ' || c == ',').unwrap_or(rest.len());
    &rest[..end]
}

/// `#` at `at` must be followed by a space or the end of the line.
fn check_comment(line: &str, at: usize, line_num: usize) -> Result<()> {
    match line.as_bytes().get(at + 1) {
        None | Some(b' ') => Ok(()),
        Some(_) => Err(ParseError::MalformedComment(line_num)),
    }
}

/// Read a quoted string whose body starts at `body`. Returns the unescaped
/// text and the index just past the closing quote. Borrows from the line
/// when no escapes are present.
fn read_quoted(line: &str, body: usize, line_num: usize) -> Result<(Cow<'_, str>, usize)> {
    let mut owned: Option<String> = None;
    let mut segment = body;
    let mut chars = line[body..]
        .char_indices()
        .map(|(i, c)| (body + i, c))
        .peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                let value = match owned {
                    Some(mut s) => {
                        s.push_str(&line[segment..i]);
                        Cow::Owned(s)
                    }
                    None => Cow::Borrowed(&line[body..i]),
                };
                return Ok((value, i + 1));
            }
            '\\' => {
                let buf = owned.get_or_insert_with(String::new);
                buf.push_str(&line[segment..i]);
                let Some((_, escape)) = chars.next() else {
                    return Err(ParseError::IncompleteEscape(line_num));
                };
                match escape {
                    '"' => buf.push('"'),
                    '\\' => buf.push('\\'),
                    '/' => buf.push('/'),
                    'n' => buf.push('\n'),
                    't' => buf.push('\t'),
                    'r' => buf.push('\r'),
                    'b' => buf.push('\u{8}'),
                    'f' => buf.push('\u{c}'),
                    'u' => buf.push(read_unicode_escape(&mut chars, line_num)?),
                    other => return Err(ParseError::InvalidEscape(line_num, other)),
                }
                segment = chars.peek().map_or(line.len(), |&(j, _)| j);
            }
            _ => {}
        }
    }
    Err(ParseError::UnterminatedString(line_num))
}

fn read_hex4<I>(chars: &mut I, line_num: usize) -> Result<u32>
where
    I: Iterator<Item = (usize, char)>,
{
    let digits: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidUnicodeEscape(line_num, digits));
    }
    u32::from_str_radix(&digits, 16).map_err(|_| ParseError::InvalidUnicodeEscape(line_num, digits))
}

/// Decode `\uXXXX`, combining a UTF-16 surrogate pair written as two escapes.
fn read_unicode_escape<I>(chars: &mut I, line_num: usize) -> Result<char>
where
    I: Iterator<Item = (usize, char)>,
{
    let high = read_hex4(chars, line_num)?;
    let invalid = || ParseError::InvalidUnicodeEscape(line_num, format!("{high:04X}"));
    let code = match high {
        0xD800..=0xDBFF => {
            let marker: String = chars.by_ref().take(2).map(|(_, c)| c).collect();
            if marker != "\\u" {
                return Err(invalid());
            }
            let low = read_hex4(chars, line_num)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(invalid());
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        }
        _ => high,
    };
    char::from_u32(code).ok_or_else(invalid)
}
