//! Line scanner.
//!
//! Splits source text into physical lines on `\n`, measures indentation and
//! enforces the per-line whitespace rules:
//! - no trailing spaces
//! - no tabs in the indentation
//!
//! Lines are produced lazily so that multi-line string content can be read
//! without the trailing-space check.

use crate::error::{ParseError, Result};

/// A single physical line of source.
#[derive(Debug, Clone, Copy)]
pub struct ScanLine<'a> {
    /// Full text of the line without its newline.
    pub text: &'a str,
    /// Number of leading spaces.
    pub indent: usize,
    /// One-based line number for error reporting.
    pub line_num: usize,
}

impl<'a> ScanLine<'a> {
    /// Text after the indentation.
    pub fn content(&self) -> &'a str {
        &self.text[self.indent..]
    }
}

/// Lazy splitter over the lines of a document.
pub struct Scanner<'a> {
    rest: Option<&'a str>,
    line_num: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            rest: if source.is_empty() { None } else { Some(source) },
            line_num: 0,
        }
    }

    /// Next raw line, without validation. A final newline does not start an
    /// extra empty line.
    pub fn next_line(&mut self) -> Option<ScanLine<'a>> {
        let rest = self.rest?;
        let text = match rest.find('\n') {
            Some(end) => {
                let tail = &rest[end + 1..];
                self.rest = if tail.is_empty() { None } else { Some(tail) };
                &rest[..end]
            }
            None => {
                self.rest = None;
                rest
            }
        };
        self.line_num += 1;
        Some(ScanLine {
            text,
            indent: count_indent(text),
            line_num: self.line_num,
        })
    }
}

/// Enforce the whitespace rules that apply to every line outside a
/// multi-line string.
pub fn validate_line(line: &ScanLine<'_>) -> Result<()> {
    if line.text.ends_with(' ') {
        return Err(ParseError::TrailingWhitespace(line.line_num));
    }
    if line.content().starts_with('\t') {
        return Err(ParseError::TabIndentation(line.line_num));
    }
    Ok(())
}

/// Count leading spaces in a line.
pub fn count_indent(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: &str) -> Vec<(usize, usize, &str)> {
        let mut scanner = Scanner::new(source);
        let mut out = Vec::new();
        while let Some(line) = scanner.next_line() {
            out.push((line.line_num, line.indent, line.text));
        }
        out
    }

    #[test]
    fn test_count_indent() {
        assert_eq!(count_indent("hello"), 0);
        assert_eq!(count_indent("  hello"), 2);
        assert_eq!(count_indent("    hello"), 4);
        assert_eq!(count_indent(""), 0);
    }

    #[test]
    fn test_split_lines() {
        assert!(lines("").is_empty());
        assert_eq!(lines("a\n"), vec![(1, 0, "a")]);
        assert_eq!(lines("a\n  b"), vec![(1, 0, "a"), (2, 2, "  b")]);
        assert_eq!(lines("a\n\nb\n"), vec![(1, 0, "a"), (2, 0, ""), (3, 0, "b")]);
    }

    #[test]
    fn test_trailing_space_rejected() {
        let mut scanner = Scanner::new("key: 1 \n");
        let line = scanner.next_line().unwrap();
        assert_eq!(
            validate_line(&line),
            Err(ParseError::TrailingWhitespace(1))
        );
    }

    #[test]
    fn test_blank_line_of_spaces_rejected() {
        let mut scanner = Scanner::new("a: 1\n   \n");
        scanner.next_line();
        let line = scanner.next_line().unwrap();
        assert_eq!(
            validate_line(&line),
            Err(ParseError::TrailingWhitespace(2))
        );
    }

    #[test]
    fn test_tab_indent_rejected() {
        let mut scanner = Scanner::new("  \tkey: 1");
        let line = scanner.next_line().unwrap();
        assert_eq!(validate_line(&line), Err(ParseError::TabIndentation(1)));
    }

    #[test]
    fn test_content() {
        let mut scanner = Scanner::new("   - x");
        let line = scanner.next_line().unwrap();
        assert_eq!(line.content(), "- x");
        assert!(scanner.next_line().is_none());
    }
}
