//! The assembled document: header, records, and the cross-reference
//! index.

use rustc_hash::FxHashMap;

use crate::model::entity::{Family, Individual, Note, Repository, Source, Submitter};
use crate::model::record::Record;

/// GEDCOM dialect declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    V5_5,
    V5_5_1,
    V7_0,
    #[default]
    Unknown,
}

impl Version {
    /// Normalizes a `HEAD.GEDC.VERS` value. Patch releases of 7.0
    /// ("7.0.14") map to [`Version::V7_0`]; anything unrecognized is
    /// [`Version::Unknown`].
    pub fn detect(raw: &str) -> Self {
        match raw.trim() {
            "5.5" => Version::V5_5,
            "5.5.1" => Version::V5_5_1,
            v if v == "7.0" || v.starts_with("7.0.") => Version::V7_0,
            _ => Version::Unknown,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Version::V5_5 => "5.5",
            Version::V5_5_1 => "5.5.1",
            Version::V7_0 => "7.0",
            Version::Unknown => "unknown",
        })
    }
}

/// Metadata projected from the HEAD record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version: Version,
    /// CHAR value (declared character set).
    pub encoding: String,
    /// SOUR value (producing system id).
    pub source_system: String,
    /// DEST value.
    pub destination: String,
    /// LANG value.
    pub language: String,
}

/// Root aggregate produced by the decoder. Immutable once assembled.
///
/// `records` holds every level-0 structure in source order, HEAD and
/// TRLR included; `header` is the projection of the HEAD record when one
/// exists. Lookups by xref are O(1) through the index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub header: Option<Header>,
    pub records: Vec<Record>,
    pub(crate) xref_index: FxHashMap<String, usize>,
}

impl Document {
    /// Looks up a record by its xref. Unknown xrefs return `None`.
    pub fn get_record(&self, xref: &str) -> Option<&Record> {
        self.xref_index.get(xref).map(|&i| &self.records[i])
    }

    pub fn get_individual(&self, xref: &str) -> Option<&Individual> {
        self.get_record(xref)?.entity.as_individual()
    }

    pub fn get_family(&self, xref: &str) -> Option<&Family> {
        self.get_record(xref)?.entity.as_family()
    }

    pub fn get_source(&self, xref: &str) -> Option<&Source> {
        self.get_record(xref)?.entity.as_source()
    }

    pub fn get_note(&self, xref: &str) -> Option<&Note> {
        self.get_record(xref)?.entity.as_note()
    }

    pub fn get_repository(&self, xref: &str) -> Option<&Repository> {
        self.get_record(xref)?.entity.as_repository()
    }

    /// All individuals in record order.
    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.records.iter().filter_map(|r| r.entity.as_individual())
    }

    /// All families in record order.
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.records.iter().filter_map(|r| r.entity.as_family())
    }

    /// All sources in record order.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.records.iter().filter_map(|r| r.entity.as_source())
    }

    /// All note records in record order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.records.iter().filter_map(|r| r.entity.as_note())
    }

    /// All repositories in record order.
    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.records.iter().filter_map(|r| r.entity.as_repository())
    }

    /// All submitters in record order.
    pub fn submitters(&self) -> impl Iterator<Item = &Submitter> {
        self.records.iter().filter_map(|r| r.entity.as_submitter())
    }

    /// Declared version, [`Version::Unknown`] without a header.
    pub fn version(&self) -> Version {
        self.header.as_ref().map(|h| h.version).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_detect() {
        assert_eq!(Version::detect("5.5"), Version::V5_5);
        assert_eq!(Version::detect(" 5.5.1 "), Version::V5_5_1);
        assert_eq!(Version::detect("7.0"), Version::V7_0);
        assert_eq!(Version::detect("7.0.14"), Version::V7_0);
        assert_eq!(Version::detect("4.0"), Version::Unknown);
        assert_eq!(Version::detect(""), Version::Unknown);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::V5_5.to_string(), "5.5");
        assert_eq!(Version::V5_5_1.to_string(), "5.5.1");
        assert_eq!(Version::V7_0.to_string(), "7.0");
        assert_eq!(Version::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_empty_document_lookups() {
        let doc = Document::default();
        assert!(doc.get_record("@I1@").is_none());
        assert!(doc.get_individual("@I1@").is_none());
        assert_eq!(doc.individuals().count(), 0);
        assert_eq!(doc.version(), Version::Unknown);
    }
}
