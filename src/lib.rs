//! GEDCOM parsing, document assembly, and validation.
//!
//! This crate ingests GEDCOM genealogical files in the three deployed
//! dialects (5.5, 5.5.1, 7.0) and produces a validated, cross-referenced
//! in-memory document model.
//!
//! # Overview
//!
//! Decoding runs in three layers:
//! - **Line parsing**: each physical line becomes a [`parser::Line`]
//!   with level, optional xref, tag, and value, with per-line and
//!   cross-line invariants enforced
//! - **Document assembly**: the flat line stream is rebuilt into a
//!   record tree, typed entities are projected, and the
//!   cross-reference index is populated
//! - **Validation**: semantic rules that need the whole document
//!   (dialect-specific tags, identifier format, dates, circular
//!   ancestry) report advisory issues
//!
//! # Quick Start
//!
//! ```rust
//! use gedcom::{decode, validate};
//!
//! let input = b"0 HEAD\n1 GEDC\n2 VERS 5.5\n\
//!               0 @I1@ INDI\n1 NAME John /Smith/\n0 TRLR\n";
//!
//! let doc = decode(&input[..]).unwrap();
//! assert_eq!(doc.records.len(), 3);
//!
//! let john = doc.get_individual("@I1@").unwrap();
//! assert_eq!(john.names[0].surname, "Smith");
//!
//! let issues = validate::validate(&doc);
//! assert!(issues.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`parser`]: line tokenization and parsing
//! - [`decoder`]: document assembly with configurable recovery,
//!   post-checks, and cancellation
//! - [`model`]: document, records, entities, and the date grammar
//! - [`validate`]: semantic validation
//! - [`encoding`]: BOM sniffing and UTF-16 conversion
//! - [`error`]: error types
//! - [`limits`]: security limits for untrusted input
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Nesting depth is capped (default 100), so tree assembly state is
//!   bounded and never recursive
//! - Line length is capped at 1 MiB
//! - Arbitrary bytes decode without panicking when error recovery is on

pub mod decoder;
pub mod encoding;
pub mod error;
pub mod limits;
pub mod model;
pub mod parser;
pub mod validate;

// Re-export commonly used types at crate root
pub use decoder::{decode, decode_with_options, DecodeOptions};
pub use error::{DecodeError, DecodeErrors, LineError, ParseError, ScanError};
pub use model::{
    Attribute, Calendar, Coordinates, Date, DateModifier, DateParseError, Document, Entity,
    Event, Family, FamilyLink, Header, Individual, Note, PersonalName, PlaceDetail, Record,
    RecordType, Source, SourceCitation, Tag, Version,
};
pub use parser::{Line, Parser};
pub use validate::{Issue, IssueCode, Validator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
