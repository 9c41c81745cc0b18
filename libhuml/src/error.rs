//! Error types for HUML parsing and encoding.

use std::io;

use thiserror::Error;

/// Result type for HUML parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token: bad escape, unclosed string, invalid number, stray character.
    Lexical,
    /// Indentation differs from what the enclosing block requires.
    Indentation,
    /// Wrong number of spaces around an indicator, comma or comment, or trailing spaces.
    Spacing,
    /// Well-formed tokens in an invalid arrangement.
    Structural,
    /// Unsupported `%HUML` version directive.
    Version,
    /// The value could not be encoded.
    Encoding,
}

/// Error type for HUML parsing.
///
/// Every variant carries the 1-based line number on which the problem was
/// detected, and displays as `line N: message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input is not valid UTF-8.
    #[error("line {0}: invalid UTF-8")]
    InvalidUtf8(usize),

    /// A character that cannot start any token.
    #[error("line {0}: unexpected character '{1}'")]
    UnexpectedCharacter(usize, char),

    /// A bare word that is neither a key nor a keyword.
    #[error("line {0}: unquoted string '{1}' is not allowed")]
    UnquotedString(usize, String),

    /// Quoted string not closed on its line.
    #[error("line {0}: unclosed string")]
    UnterminatedString(usize),

    /// Backslash at the very end of a line.
    #[error("line {0}: incomplete escape sequence")]
    IncompleteEscape(usize),

    /// Unknown escape character.
    #[error("line {0}: invalid escape character '\\{1}'")]
    InvalidEscape(usize, char),

    /// Malformed `\uXXXX` escape.
    #[error("line {0}: invalid unicode escape sequence '\\u{1}'")]
    InvalidUnicodeEscape(usize, String),

    /// Number literal that cannot be read.
    #[error("line {0}: invalid number literal '{1}'")]
    InvalidNumberLiteral(usize, String),

    /// Multi-line string without its closing delimiter (reported at the opening line).
    #[error("line {0}: unclosed multiline string")]
    UnterminatedMultilineString(usize),

    /// Tab character used for indentation.
    #[error("line {0}: tabs are not allowed for indentation")]
    TabIndentation(usize),

    /// Line ends in a space.
    #[error("line {0}: trailing spaces are not allowed")]
    TrailingWhitespace(usize),

    /// `#` not followed by a space.
    #[error("line {0}: comment hash '#' must be followed by a space")]
    MalformedComment(usize),

    /// Value immediately followed by `#`.
    #[error("line {0}: a value must be separated from an inline comment by a space")]
    MissingSpaceBeforeComment(usize),

    /// A required single space is missing.
    #[error("line {0}: expected single space {1}")]
    ExpectedSingleSpace(usize, &'static str),

    /// More than one space where exactly one is required.
    #[error("line {0}: expected single space {1}, found multiple")]
    MultipleSpaces(usize, &'static str),

    /// Space before a comma in an inline collection.
    #[error("line {0}: no spaces allowed before comma")]
    SpaceBeforeComma(usize),

    /// Space between a key and its indicator.
    #[error("line {0}: no spaces allowed between a key and its indicator")]
    SpaceBeforeIndicator(usize),

    /// Root value does not start at column 0.
    #[error("line {0}: root element must not be indented")]
    RootIndented(usize),

    /// Line indentation does not match the enclosing block.
    #[error("line {line}: bad indent {found}, expected {expected}")]
    BadIndent {
        line: usize,
        found: usize,
        expected: usize,
    },

    /// Same key twice in one dict.
    #[error("line {0}: duplicate key '{1}' in dict")]
    DuplicateKey(usize, String),

    /// Content after a value on the same line.
    #[error("line {0}: unexpected content at end of line")]
    UnexpectedTrailingContent(usize),

    /// Content after the completed root value.
    #[error("line {0}: unexpected content after {1}")]
    UnexpectedContentAfterRoot(usize, &'static str),

    /// `:` or `::` used at the document root without a key.
    #[error("line {0}: '{1}' indicator not allowed at document root")]
    RootIndicatorNotAllowed(usize, &'static str),

    /// `::` followed by nothing at a deeper indentation.
    #[error("line {0}: ambiguous empty vector after '::', use [] or {{}}")]
    AmbiguousEmptyVector(usize),

    /// A dict line that does not start with a key.
    #[error("line {0}: expected a key")]
    ExpectedKey(usize),

    /// A line inside a multi-line list that is not a `-` item.
    #[error("line {0}: expected a '-' list item")]
    ExpectedListItem(usize),

    /// Key not followed by `:` or `::`.
    #[error("line {0}: expected ':' or '::' after key")]
    ExpectedIndicator(usize),

    /// Inline dict key not followed by `:`.
    #[error("line {0}: expected ':' in inline dict")]
    ExpectedScalarIndicator(usize),

    /// Inline collection items not separated by a comma.
    #[error("line {0}: expected a comma in inline collection")]
    ExpectedComma(usize),

    /// Token that cannot appear where a value is expected.
    #[error("line {0}: unexpected {1} when parsing value")]
    UnexpectedToken(usize, String),

    /// Multi-line string inside an inline collection.
    #[error("line {0}: multiline strings are not allowed in inline collections")]
    MultilineStringNotAllowed(usize),

    /// Input ended where a value was required.
    #[error("line {0}: unexpected end of input, expected a value")]
    UnexpectedEnd(usize),

    /// No content at all.
    #[error("line {0}: empty document is undefined")]
    EmptyDocument(usize),

    /// Vectors nested beyond the parser's limit.
    #[error("line {0}: vectors nested deeper than {1} levels")]
    NestingTooDeep(usize, usize),

    /// `%HUML` directive naming another version.
    #[error("line {0}: unsupported HUML version '{1}'")]
    UnsupportedVersion(usize, String),
}

impl ParseError {
    /// The 1-based line on which the error was detected.
    pub fn line(&self) -> usize {
        use ParseError::*;
        match self {
            InvalidUtf8(line)
            | UnexpectedCharacter(line, _)
            | UnquotedString(line, _)
            | UnterminatedString(line)
            | IncompleteEscape(line)
            | InvalidEscape(line, _)
            | InvalidUnicodeEscape(line, _)
            | InvalidNumberLiteral(line, _)
            | UnterminatedMultilineString(line)
            | TabIndentation(line)
            | TrailingWhitespace(line)
            | MalformedComment(line)
            | MissingSpaceBeforeComment(line)
            | ExpectedSingleSpace(line, _)
            | MultipleSpaces(line, _)
            | SpaceBeforeComma(line)
            | SpaceBeforeIndicator(line)
            | RootIndented(line)
            | BadIndent { line, .. }
            | DuplicateKey(line, _)
            | UnexpectedTrailingContent(line)
            | UnexpectedContentAfterRoot(line, _)
            | RootIndicatorNotAllowed(line, _)
            | AmbiguousEmptyVector(line)
            | ExpectedKey(line)
            | ExpectedListItem(line)
            | ExpectedIndicator(line)
            | ExpectedScalarIndicator(line)
            | ExpectedComma(line)
            | UnexpectedToken(line, _)
            | MultilineStringNotAllowed(line)
            | UnexpectedEnd(line)
            | EmptyDocument(line)
            | NestingTooDeep(line, _)
            | UnsupportedVersion(line, _) => *line,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use ParseError::*;
        match self {
            InvalidUtf8(_)
            | UnexpectedCharacter(..)
            | UnquotedString(..)
            | UnterminatedString(_)
            | IncompleteEscape(_)
            | InvalidEscape(..)
            | InvalidUnicodeEscape(..)
            | InvalidNumberLiteral(..)
            | UnterminatedMultilineString(_)
            | TabIndentation(_) => ErrorKind::Lexical,

            TrailingWhitespace(_)
            | MalformedComment(_)
            | MissingSpaceBeforeComment(_)
            | ExpectedSingleSpace(..)
            | MultipleSpaces(..)
            | SpaceBeforeComma(_)
            | SpaceBeforeIndicator(_) => ErrorKind::Spacing,

            RootIndented(_) | BadIndent { .. } => ErrorKind::Indentation,

            DuplicateKey(..)
            | UnexpectedTrailingContent(_)
            | UnexpectedContentAfterRoot(..)
            | RootIndicatorNotAllowed(..)
            | AmbiguousEmptyVector(_)
            | ExpectedKey(_)
            | ExpectedListItem(_)
            | ExpectedIndicator(_)
            | ExpectedScalarIndicator(_)
            | ExpectedComma(_)
            | UnexpectedToken(..)
            | MultilineStringNotAllowed(_)
            | UnexpectedEnd(_)
            | EmptyDocument(_)
            | NestingTooDeep(..) => ErrorKind::Structural,

            UnsupportedVersion(..) => ErrorKind::Version,
        }
    }
}

/// Error type for HUML encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Value nested deeper than the configured limit.
    #[error("value nested deeper than {0} levels")]
    DepthLimitExceeded(usize),

    /// Integer that does not fit in a 64-bit signed HUML integer.
    #[error("integer {0} does not fit in a 64-bit signed integer")]
    IntegerOutOfRange(String),
}

impl EncodeError {
    /// Classify this error. Always [`ErrorKind::Encoding`].
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Encoding
    }
}

/// Error type for the streaming [`Decoder`](crate::Decoder) and [`Encoder`](crate::Encoder).
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_line() {
        let err = ParseError::DuplicateKey(2, "key".to_string());
        assert_eq!(err.to_string(), "line 2: duplicate key 'key' in dict");
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ParseError::TrailingWhitespace(1).kind(), ErrorKind::Spacing);
        assert_eq!(ParseError::AmbiguousEmptyVector(1).kind(), ErrorKind::Structural);
        assert_eq!(ParseError::ExpectedListItem(1).kind(), ErrorKind::Structural);
        assert_eq!(
            ParseError::BadIndent {
                line: 3,
                found: 4,
                expected: 2
            }
            .kind(),
            ErrorKind::Indentation
        );
        assert_eq!(
            ParseError::UnsupportedVersion(1, "v9".into()).kind(),
            ErrorKind::Version
        );
        assert_eq!(
            EncodeError::DepthLimitExceeded(3).kind(),
            ErrorKind::Encoding
        );
    }

    #[test]
    fn test_ambiguous_message_braces() {
        assert_eq!(
            ParseError::AmbiguousEmptyVector(4).to_string(),
            "line 4: ambiguous empty vector after '::', use [] or {}"
        );
    }
}
