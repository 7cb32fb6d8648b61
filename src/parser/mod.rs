//! Low-level GEDCOM line parsing.
//!
//! Converts physical lines into [`Line`] structures carrying level, tag,
//! value, and cross-reference information, with detailed error reporting
//! keyed by line number. Hierarchy well-formedness (a level may grow by
//! at most one per line) is enforced across the stream.
//!
//! ```rust
//! use gedcom::parser::Parser;
//!
//! let mut parser = Parser::new();
//! let line = parser.parse_line("0 @I1@ INDI").unwrap();
//! assert_eq!(line.level, 0);
//! assert_eq!(line.xref, "@I1@");
//! assert_eq!(line.tag, "INDI");
//! ```

pub mod scan;

use std::fmt;
use std::io::Read;

use crate::error::{LevelReason, LineError, ParseError, TagReason, XRefReason};
use crate::limits::{MAX_NESTING_DEPTH, MAX_TAG_LEN};
use crate::parser::scan::LineScanner;

/// One parsed GEDCOM line: `LEVEL [XREF] TAG [VALUE]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// Nesting level, `0` for record roots.
    pub level: usize,
    /// Cross-reference identifier (`@I1@`), empty when absent.
    pub xref: String,
    /// The tag, 1–31 characters of `[A-Za-z0-9_]`.
    pub tag: String,
    /// Everything after the tag, internal spacing preserved.
    pub value: String,
    /// 1-based position in the source.
    pub line_number: usize,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if !self.xref.is_empty() {
            write!(f, " {}", self.xref)?;
        }
        write!(f, " {}", self.tag)?;
        if !self.value.is_empty() {
            write!(f, " {}", self.value)?;
        }
        Ok(())
    }
}

/// Streaming GEDCOM line parser.
///
/// Tracks the line counter and the last successfully parsed level so the
/// level-delta invariant can be enforced across calls. Reusable across
/// inputs via [`Parser::reset`].
#[derive(Debug)]
pub struct Parser {
    line_number: usize,
    last_level: Option<usize>,
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            line_number: 0,
            last_level: None,
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Resets the line counter and level state for reuse.
    pub fn reset(&mut self) {
        self.line_number = 0;
        self.last_level = None;
    }

    /// Sets the maximum allowed nesting depth. Zero resets to the
    /// default of [`MAX_NESTING_DEPTH`].
    pub fn set_max_nesting_depth(&mut self, max: usize) {
        self.max_depth = if max == 0 { MAX_NESTING_DEPTH } else { max };
    }

    /// Parses a single GEDCOM line.
    ///
    /// The line counter advances even when parsing fails, so errors from
    /// a recovery stream keep accurate positions.
    pub fn parse_line(&mut self, input: &str) -> Result<Line, ParseError> {
        self.line_number += 1;
        let n = self.line_number;

        let line = input.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            return Err(ParseError::with_cause(n, "empty line", input, LineError::EmptyLine));
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(ParseError::with_cause(
                n,
                "line must have at least level and tag (expected a tag like HEAD, INDI, FAM, or SOUR)",
                line,
                LineError::MissingTag,
            ));
        }

        let level = match fields[0].parse::<i64>() {
            Err(_) => {
                return Err(ParseError::with_cause(
                    n,
                    "invalid level number",
                    line,
                    LineError::InvalidLevel {
                        raw: fields[0].to_string(),
                        reason: LevelReason::NotANumber,
                    },
                ))
            }
            Ok(l) if l < 0 => {
                return Err(ParseError::with_cause(
                    n,
                    "level cannot be negative",
                    line,
                    LineError::InvalidLevel {
                        raw: fields[0].to_string(),
                        reason: LevelReason::Negative,
                    },
                ))
            }
            Ok(l) => l as usize,
        };

        if level > self.max_depth {
            return Err(ParseError::with_cause(
                n,
                "maximum nesting depth exceeded",
                line,
                LineError::InvalidLevel {
                    raw: fields[0].to_string(),
                    reason: LevelReason::ExceedsMaxDepth,
                },
            ));
        }

        if let Some(prev) = self.last_level {
            if level > prev + 1 {
                return Err(ParseError::with_cause(
                    n,
                    "level jump exceeds one",
                    line,
                    LineError::LevelMismatch { previous: prev, current: level },
                ));
            }
        }

        let (xref, tag, value_start_field) =
            if fields[1].starts_with('@') && fields[1].ends_with('@') {
                if let Err(e) = validate_xref(fields[1]) {
                    let message = e.to_string();
                    return Err(ParseError::with_cause(n, message, line, e));
                }
                let Some(&tag) = fields.get(2) else {
                    return Err(ParseError::with_cause(
                        n,
                        "line with xref must have a tag (expected a tag like INDI, FAM, or SOUR)",
                        line,
                        LineError::MissingTag,
                    ));
                };
                (fields[1], tag, 3)
            } else {
                ("", fields[1], 2)
            };

        if let Err(e) = validate_tag(tag) {
            let message = format!("{e} (expected A-Z, 0-9, underscore, max length 31)");
            return Err(ParseError::with_cause(n, message, line, e));
        }

        let value = if fields.len() > value_start_field {
            field_start_index(line, value_start_field)
                .map(|pos| &line[pos..])
                .unwrap_or("")
        } else {
            ""
        };

        self.last_level = Some(level);

        Ok(Line {
            level,
            xref: xref.to_string(),
            tag: tag.to_string(),
            value: value.to_string(),
            line_number: n,
        })
    }

    /// Parses an entire stream, aborting on the first error.
    ///
    /// All line-ending styles are supported: LF (Unix), CRLF (Windows),
    /// CR (old Macintosh). Errors carry a `prev: … | line: …` context
    /// when a previous line exists.
    pub fn parse<R: Read>(&mut self, reader: R) -> Result<Vec<Line>, ParseError> {
        self.reset();

        let mut scanner = LineScanner::new(reader);
        let mut lines = Vec::new();
        let mut prev_line = String::new();

        loop {
            match scanner.next_line() {
                Ok(Some(raw)) => {
                    let text = String::from_utf8_lossy(&raw).into_owned();
                    match self.parse_line(&text) {
                        Ok(line) => {
                            lines.push(line);
                            prev_line = text;
                        }
                        Err(e) => return Err(e.enrich(&prev_line, &text)),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(ParseError::with_cause(self.line_number, "error reading input", "", e))
                }
            }
        }

        Ok(lines)
    }

    /// Parses an entire stream, skipping bad lines and collecting their
    /// errors. The previous-line context tracks the last successfully
    /// parsed raw line.
    pub fn parse_with_recovery<R: Read>(&mut self, reader: R) -> (Vec<Line>, Vec<ParseError>) {
        self.reset();

        let mut scanner = LineScanner::new(reader);
        let mut lines = Vec::new();
        let mut errors = Vec::new();
        let mut prev_line = String::new();

        loop {
            match scanner.next_line() {
                Ok(Some(raw)) => {
                    let text = String::from_utf8_lossy(&raw).into_owned();
                    match self.parse_line(&text) {
                        Ok(line) => {
                            lines.push(line);
                            prev_line = text;
                        }
                        Err(e) => errors.push(e.enrich(&prev_line, &text)),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    errors.push(ParseError::with_cause(
                        self.line_number,
                        "error reading input",
                        "",
                        e,
                    ));
                    break;
                }
            }
        }

        (lines, errors)
    }
}

/// Byte index where the `field_index`-th whitespace-separated field
/// starts, or `None` if the line has fewer fields.
fn field_start_index(line: &str, field_index: usize) -> Option<usize> {
    let mut in_field = false;
    let mut field = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            in_field = false;
            continue;
        }
        if !in_field {
            if field == field_index {
                return Some(i);
            }
            field += 1;
            in_field = true;
        }
    }

    None
}

fn validate_tag(tag: &str) -> Result<(), LineError> {
    if tag.is_empty() {
        return Err(LineError::InvalidTag {
            tag: tag.to_string(),
            reason: TagReason::Empty,
        });
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(LineError::InvalidTag {
            tag: tag.to_string(),
            reason: TagReason::TooLong,
        });
    }
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(LineError::InvalidTag {
            tag: tag.to_string(),
            reason: TagReason::InvalidCharacters,
        });
    }
    Ok(())
}

fn validate_xref(xref: &str) -> Result<(), LineError> {
    if xref.len() <= 2 {
        return Err(LineError::InvalidXRef {
            xref: xref.to_string(),
            reason: XRefReason::Empty,
        });
    }
    if xref.matches('@').count() != 2 {
        return Err(LineError::InvalidXRef {
            xref: xref.to_string(),
            reason: XRefReason::UnbalancedDelimiters,
        });
    }
    let body = &xref[1..xref.len() - 1];
    if !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(LineError::InvalidXRef {
            xref: xref.to_string(),
            reason: XRefReason::InvalidCharacters,
        });
    }
    Ok(())
}
