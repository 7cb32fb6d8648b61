//! Domain entities projected from records by the decoder.
//!
//! Entities reference each other by xref string, never by pointer:
//! family links are inherently cyclic (HUSB ↔ FAMC), so resolution goes
//! through the document's index at query time.

use crate::model::date::Date;
use crate::model::document::Document;

/// One name of an individual. `given` and `surname` come from GIVN/SURN
/// subtags when present, otherwise from the `/Surname/` convention in
/// the full name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonalName {
    pub full: String,
    pub given: String,
    pub surname: String,
}

/// Link from an individual to a family record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilyLink {
    pub family_xref: String,
    /// PEDI subtag value (birth, adopted, …), empty when absent.
    pub pedigree: String,
}

/// A dated, placed occurrence (BIRT, DEAT, MARR, …).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// The event tag (BIRT, DEAT, MARR, …).
    pub event_type: String,
    /// Value on the event line itself.
    pub description: String,
    /// TYPE subtag detail.
    pub event_type_detail: String,
    /// Raw DATE value, retained even when unparseable.
    pub date: String,
    /// Parsed date; `None` when `date` is empty or malformed.
    pub parsed_date: Option<Date>,
    /// Raw PLAC value.
    pub place: String,
    pub place_detail: Option<PlaceDetail>,
    pub source_citations: Vec<SourceCitation>,
}

/// A descriptive attribute (OCCU, RESI, TITL, …).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attribute {
    pub attribute_type: String,
    pub value: String,
    pub date: String,
    pub parsed_date: Option<Date>,
    pub place: String,
    pub source_citations: Vec<SourceCitation>,
}

/// Structured place data from a PLAC subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceDetail {
    pub name: String,
    /// FORM subtag (jurisdiction hierarchy), empty when absent.
    pub form: String,
    pub coordinates: Option<Coordinates>,
}

/// Raw MAP coordinates (LATI/LONG values, e.g. `N51.5` / `W0.12`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// A citation of a source record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceCitation {
    /// Xref of the cited SOUR record.
    pub source_xref: String,
    /// PAGE subtag.
    pub page: String,
    /// Quoted text from DATA.TEXT.
    pub text: String,
}

/// Projection of an INDI record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Individual {
    pub xref: String,
    pub names: Vec<PersonalName>,
    pub sex: String,
    pub events: Vec<Event>,
    pub attributes: Vec<Attribute>,
    /// Families this individual is a child in (FAMC).
    pub child_in_families: Vec<FamilyLink>,
    /// Families this individual is a spouse in (FAMS).
    pub spouse_in_families: Vec<FamilyLink>,
    /// Note references or inline note text.
    pub notes: Vec<String>,
    pub source_citations: Vec<SourceCitation>,
}

impl Individual {
    /// Resolves this individual's parents through FAMC links: the HUSB
    /// and WIFE of every family the individual is a child in.
    pub fn parents<'a>(&self, doc: &'a Document) -> Vec<&'a Individual> {
        let mut parents = Vec::new();
        for link in &self.child_in_families {
            let Some(family) = doc.get_family(&link.family_xref) else {
                continue;
            };
            for parent_xref in [&family.husband, &family.wife] {
                if parent_xref.is_empty() {
                    continue;
                }
                if let Some(parent) = doc.get_individual(parent_xref) {
                    parents.push(parent);
                }
            }
        }
        parents
    }
}

/// Projection of a FAM record. Member fields hold xref strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Family {
    pub xref: String,
    pub husband: String,
    pub wife: String,
    pub children: Vec<String>,
    pub events: Vec<Event>,
    pub notes: Vec<String>,
    pub source_citations: Vec<SourceCitation>,
}

/// Projection of a SOUR record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub xref: String,
    pub title: String,
    pub author: String,
    pub publication: String,
    pub text: String,
    /// Raw CHAN.DATE value.
    pub change_date: String,
}

/// Projection of a NOTE record with CONT/CONC continuation applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Note {
    pub xref: String,
    pub text: String,
}

impl Note {
    pub fn full_text(&self) -> &str {
        &self.text
    }
}

/// Projection of a REPO record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repository {
    pub xref: String,
    pub name: String,
}

/// Projection of a SUBM record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submitter {
    pub xref: String,
    pub name: String,
}

/// Type-specific projection attached to a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Entity {
    #[default]
    None,
    Individual(Individual),
    Family(Family),
    Source(Source),
    Note(Note),
    Repository(Repository),
    Submitter(Submitter),
}

impl Entity {
    pub fn as_individual(&self) -> Option<&Individual> {
        match self {
            Entity::Individual(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_family(&self) -> Option<&Family> {
        match self {
            Entity::Family(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&Source> {
        match self {
            Entity::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Entity::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_repository(&self) -> Option<&Repository> {
        match self {
            Entity::Repository(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_submitter(&self) -> Option<&Submitter> {
        match self {
            Entity::Submitter(s) => Some(s),
            _ => None,
        }
    }
}
