//! Error types for GEDCOM parsing, decoding, and scanning.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::model::Document;

/// Reason a line level failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelReason {
    /// The level field did not parse as an integer.
    NotANumber,
    /// The level parsed but was negative.
    Negative,
    /// The level exceeds the configured maximum nesting depth.
    ExceedsMaxDepth,
}

impl fmt::Display for LevelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LevelReason::NotANumber => "not a number",
            LevelReason::Negative => "negative",
            LevelReason::ExceedsMaxDepth => "exceeds max depth",
        })
    }
}

/// Reason a tag failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagReason {
    Empty,
    TooLong,
    InvalidCharacters,
}

impl fmt::Display for TagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagReason::Empty => "empty",
            TagReason::TooLong => "too long",
            TagReason::InvalidCharacters => "contains invalid characters",
        })
    }
}

/// Reason a cross-reference identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefReason {
    Empty,
    UnbalancedDelimiters,
    InvalidCharacters,
}

impl fmt::Display for XRefReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            XRefReason::Empty => "empty",
            XRefReason::UnbalancedDelimiters => "must start and end with @",
            XRefReason::InvalidCharacters => "contains invalid characters",
        })
    }
}

/// A per-line grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("empty line")]
    EmptyLine,

    #[error("line must have at least level and tag")]
    MissingTag,

    #[error("invalid level {raw:?}: {reason}")]
    InvalidLevel { raw: String, reason: LevelReason },

    #[error("level jump from {previous} to {current}")]
    LevelMismatch { previous: usize, current: usize },

    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: TagReason },

    #[error("invalid xref {xref:?}: {reason}")]
    InvalidXRef { xref: String, reason: XRefReason },
}

/// Error from the logical-line scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("line length {len} exceeds maximum {max}")]
    LineTooLong { len: usize, max: usize },
}

/// Underlying cause of a [`ParseError`].
#[derive(Debug, Error)]
pub enum ParseCause {
    #[error(transparent)]
    Grammar(#[from] LineError),

    #[error(transparent)]
    Read(#[from] ScanError),
}

/// An error that occurred while parsing a line, enriched with the line
/// number and raw-line context.
///
/// Recovery streams widen `context` to `prev: <previous-line> |
/// line: <current-line>` so the surrounding source is visible without
/// re-reading the input.
#[derive(Debug)]
pub struct ParseError {
    /// 1-based line number where the error occurred.
    pub line: usize,
    /// Description of what went wrong.
    pub message: String,
    /// Raw line content that caused the error.
    pub context: String,
    /// The underlying violation, if any.
    pub cause: Option<ParseCause>,
}

impl ParseError {
    pub(crate) fn new(line: usize, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            context: context.into(),
            cause: None,
        }
    }

    pub(crate) fn with_cause(
        line: usize,
        message: impl Into<String>,
        context: impl Into<String>,
        cause: impl Into<ParseCause>,
    ) -> Self {
        Self {
            line,
            message: message.into(),
            context: context.into(),
            cause: Some(cause.into()),
        }
    }

    /// Widens the context with the previously scanned raw line.
    pub(crate) fn enrich(mut self, prev_line: &str, current_line: &str) -> Self {
        self.context = if prev_line.is_empty() {
            current_line.to_string()
        } else {
            format!("prev: {prev_line} | line: {current_line}")
        };
        self
    }

    /// Returns the grammar violation behind this error, if any.
    pub fn grammar(&self) -> Option<&LineError> {
        match &self.cause {
            Some(ParseCause::Grammar(e)) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "line {}: {}", self.line, self.message)
        } else {
            write!(f, "line {}: {} (context: {:?})", self.line, self.message, self.context)
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

fn write_line_context(
    f: &mut fmt::Formatter<'_>,
    line: &usize,
    message: &str,
    context: &str,
) -> fmt::Result {
    if context.is_empty() {
        write!(f, "line {line}: {message}")
    } else {
        write!(f, "line {line}: {message} (context: {context:?})")
    }
}

/// Error produced while assembling a [`Document`] from a line stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Fatal I/O failure on the underlying byte source.
    #[error("line {line}: error reading input")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    /// A record xref that is already mapped; the first mapping wins.
    #[error("duplicate xref {xref} at line {line} (first defined at line {first_line})")]
    DuplicateXRef {
        xref: String,
        first_line: usize,
        line: usize,
    },

    /// A tag value references a record that does not exist.
    #[error("{}", BrokenXRefDisplay(.xref, .line, .tag, .record_xref, .context))]
    BrokenXRef {
        xref: String,
        line: usize,
        tag: String,
        record_xref: String,
        context: String,
    },

    #[error("{}", MissingDisplay("missing HEAD record", .line, .context))]
    MissingHeader { line: usize, context: String },

    #[error("{}", MissingDisplay("missing TRLR record", .line, .context))]
    MissingTrailer { line: usize, context: String },

    /// A tag beginning with `_` was seen while strict mode was on.
    #[error("{}", NonStandardTagDisplay(.line, .tag, .context))]
    NonStandardTag {
        line: usize,
        tag: String,
        context: String,
    },

    /// The cancellation handle was signalled. Carries the partial
    /// document when error recovery is on.
    #[error("decoding cancelled")]
    Cancelled { partial: Option<Box<Document>> },
}

struct BrokenXRefDisplay<'a>(&'a str, &'a usize, &'a str, &'a str, &'a str);

impl fmt::Display for BrokenXRefDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let BrokenXRefDisplay(xref, line, tag, record_xref, context) = self;
        write!(f, "line {line}: broken reference {xref} in {tag}")?;
        if !record_xref.is_empty() {
            write!(f, " (record {record_xref})")?;
        }
        if !context.is_empty() {
            write!(f, " (context: {context:?})")?;
        }
        Ok(())
    }
}

struct MissingDisplay<'a>(&'static str, &'a usize, &'a str);

impl fmt::Display for MissingDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_context(f, self.1, self.0, self.2)
    }
}

struct NonStandardTagDisplay<'a>(&'a usize, &'a str, &'a str);

impl fmt::Display for NonStandardTagDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_context(f, self.0, &format!("non-standard tag {:?}", self.1), self.2)
    }
}

/// Aggregate of decode errors collected in recovery mode, in source
/// order.
#[derive(Debug, Default)]
pub struct DecodeErrors {
    pub errors: Vec<DecodeError>,
}

impl DecodeErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodeError> {
        self.errors.iter()
    }
}

impl fmt::Display for DecodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no decode errors"),
            [only] => only.fmt(f),
            [first, ..] => write!(f, "{} decode errors: {first}", self.errors.len()),
        }
    }
}

impl std::error::Error for DecodeErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(2, "bad line", "");
        assert_eq!(err.to_string(), "line 2: bad line");

        let err = ParseError::new(3, "empty line", "   ");
        assert_eq!(err.to_string(), "line 3: empty line (context: \"   \")");
    }

    #[test]
    fn test_line_error_messages() {
        let err = LineError::InvalidLevel {
            raw: "X".to_string(),
            reason: LevelReason::NotANumber,
        };
        assert_eq!(err.to_string(), "invalid level \"X\": not a number");

        let err = LineError::LevelMismatch { previous: 1, current: 3 };
        assert_eq!(err.to_string(), "level jump from 1 to 3");
    }

    #[test]
    fn test_broken_xref_display() {
        let err = DecodeError::BrokenXRef {
            xref: "@I99@".to_string(),
            line: 2,
            tag: "HUSB".to_string(),
            record_xref: "@F1@".to_string(),
            context: "HUSB @I99@".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line 2: broken reference @I99@ in HUSB (record @F1@) (context: \"HUSB @I99@\")"
        );

        let err = DecodeError::BrokenXRef {
            xref: "@I99@".to_string(),
            line: 2,
            tag: "HUSB".to_string(),
            record_xref: String::new(),
            context: String::new(),
        };
        assert_eq!(err.to_string(), "line 2: broken reference @I99@ in HUSB");
    }

    #[test]
    fn test_decode_errors_display() {
        let empty = DecodeErrors::default();
        assert_eq!(empty.to_string(), "no decode errors");

        let one = DecodeErrors {
            errors: vec![DecodeError::MissingHeader { line: 1, context: String::new() }],
        };
        assert_eq!(one.to_string(), "line 1: missing HEAD record");

        let two = DecodeErrors {
            errors: vec![
                DecodeError::MissingHeader { line: 1, context: String::new() },
                DecodeError::MissingTrailer { line: 9, context: String::new() },
            ],
        };
        assert_eq!(two.to_string(), "2 decode errors: line 1: missing HEAD record");
    }

    #[test]
    fn test_parse_error_source_chain() {
        use std::error::Error as _;

        let err = ParseError::with_cause(
            4,
            "invalid tag",
            "0 !!",
            LineError::InvalidTag {
                tag: "!!".to_string(),
                reason: TagReason::InvalidCharacters,
            },
        );
        let source = err.source().expect("cause retained");
        assert!(source.to_string().contains("invalid characters"));
    }
}
