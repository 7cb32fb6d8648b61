//! Data model types for GEDCOM documents.
//!
//! - [`document`]: the root aggregate, header, and version detection
//! - [`record`]: the raw level-0 record tree with its tag subtrees
//! - [`entity`]: typed projections (individuals, families, sources, …)
//! - [`date`]: the GEDCOM date grammar

pub mod date;
pub mod document;
pub mod entity;
pub mod record;

pub use date::{Calendar, Date, DateModifier, DateParseError};
pub use document::{Document, Header, Version};
pub use entity::{
    Attribute, Coordinates, Entity, Event, Family, FamilyLink, Individual, Note, PersonalName,
    PlaceDetail, Repository, Source, SourceCitation, Submitter,
};
pub use record::{Record, RecordType, Tag};
