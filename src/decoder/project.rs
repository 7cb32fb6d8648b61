//! Projection of raw record trees into typed entities.

use crate::model::{
    Attribute, Coordinates, Date, Entity, Event, Family, FamilyLink, Header, Individual, Note,
    PersonalName, PlaceDetail, Record, RecordType, Repository, Source, SourceCitation, Submitter,
    Tag, Version,
};

const INDI_EVENT_TAGS: &[&str] = &[
    "BIRT", "CHR", "CHRA", "DEAT", "BURI", "CREM", "ADOP", "BAPM", "BARM", "BASM", "BLES",
    "CONF", "FCOM", "ORDN", "NATU", "EMIG", "IMMI", "CENS", "PROB", "WILL", "GRAD", "RETI",
    "EVEN",
];

const INDI_ATTRIBUTE_TAGS: &[&str] = &[
    "CAST", "DSCR", "EDUC", "IDNO", "NATI", "NCHI", "NMR", "OCCU", "PROP", "RELI", "RESI",
    "SSN", "TITL", "FACT",
];

const FAM_EVENT_TAGS: &[&str] = &[
    "ANUL", "CENS", "DIV", "DIVF", "ENGA", "MARB", "MARC", "MARR", "MARL", "MARS", "RESI",
    "EVEN",
];

/// Fills in `record.entity` from the record's tag tree.
pub(crate) fn project(record: &mut Record) {
    record.entity = match record.record_type {
        RecordType::Individual => Entity::Individual(project_individual(record)),
        RecordType::Family => Entity::Family(project_family(record)),
        RecordType::Source => Entity::Source(project_source(record)),
        RecordType::Note => Entity::Note(project_note(record)),
        RecordType::Repository => Entity::Repository(project_repository(record)),
        RecordType::Submitter => Entity::Submitter(project_submitter(record)),
        _ => Entity::None,
    };
}

/// Projects the HEAD record onto document metadata.
pub(crate) fn project_header(record: &Record) -> Header {
    let mut header = Header::default();
    for tag in &record.tags {
        match tag.tag.as_str() {
            "GEDC" => header.version = Version::detect(tag.child_value("VERS")),
            "CHAR" => header.encoding = tag.value.clone(),
            "SOUR" => header.source_system = tag.value.clone(),
            "DEST" => header.destination = tag.value.clone(),
            "LANG" => header.language = tag.value.clone(),
            _ => {}
        }
    }
    header
}

fn project_individual(record: &Record) -> Individual {
    let mut individual = Individual {
        xref: record.xref.clone(),
        ..Individual::default()
    };
    for tag in &record.tags {
        match tag.tag.as_str() {
            "NAME" => individual.names.push(project_name(tag)),
            "SEX" => individual.sex = tag.value.clone(),
            "FAMC" => individual.child_in_families.push(family_link(tag)),
            "FAMS" => individual.spouse_in_families.push(family_link(tag)),
            "NOTE" => individual.notes.push(tag.value.clone()),
            "SOUR" => individual.source_citations.push(project_citation(tag)),
            t if INDI_EVENT_TAGS.contains(&t) => individual.events.push(project_event(tag)),
            t if INDI_ATTRIBUTE_TAGS.contains(&t) => {
                individual.attributes.push(project_attribute(tag))
            }
            _ => {}
        }
    }
    individual
}

fn project_family(record: &Record) -> Family {
    let mut family = Family {
        xref: record.xref.clone(),
        ..Family::default()
    };
    for tag in &record.tags {
        match tag.tag.as_str() {
            "HUSB" => family.husband = tag.value.clone(),
            "WIFE" => family.wife = tag.value.clone(),
            "CHIL" => family.children.push(tag.value.clone()),
            "NOTE" => family.notes.push(tag.value.clone()),
            "SOUR" => family.source_citations.push(project_citation(tag)),
            t if FAM_EVENT_TAGS.contains(&t) => family.events.push(project_event(tag)),
            _ => {}
        }
    }
    family
}

fn project_source(record: &Record) -> Source {
    let mut source = Source {
        xref: record.xref.clone(),
        ..Source::default()
    };
    for tag in &record.tags {
        match tag.tag.as_str() {
            "TITL" => source.title = tag.value.clone(),
            "AUTH" => source.author = tag.value.clone(),
            "PUBL" => source.publication = tag.value.clone(),
            "TEXT" => source.text = assemble_text(&tag.value, &tag.children),
            "CHAN" => source.change_date = tag.child_value("DATE").to_string(),
            _ => {}
        }
    }
    source
}

fn project_note(record: &Record) -> Note {
    Note {
        xref: record.xref.clone(),
        text: assemble_text(&record.value, &record.tags),
    }
}

fn project_repository(record: &Record) -> Repository {
    Repository {
        xref: record.xref.clone(),
        name: record.find("NAME").map(|t| t.value.clone()).unwrap_or_default(),
    }
}

fn project_submitter(record: &Record) -> Submitter {
    Submitter {
        xref: record.xref.clone(),
        name: record.find("NAME").map(|t| t.value.clone()).unwrap_or_default(),
    }
}

fn project_name(tag: &Tag) -> PersonalName {
    let full = tag.value.clone();
    let (derived_given, derived_surname) = split_name(&full);
    let given = match tag.find("GIVN") {
        Some(t) => t.value.clone(),
        None => derived_given,
    };
    let surname = match tag.find("SURN") {
        Some(t) => t.value.clone(),
        None => derived_surname,
    };
    PersonalName { full, given, surname }
}

/// Splits `John /Smith/` into given and surname parts. Without the
/// slash convention the whole value counts as given.
fn split_name(full: &str) -> (String, String) {
    let Some(start) = full.find('/') else {
        return (full.trim().to_string(), String::new());
    };
    let rest = &full[start + 1..];
    let surname = match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    };
    (full[..start].trim().to_string(), surname.trim().to_string())
}

fn family_link(tag: &Tag) -> FamilyLink {
    FamilyLink {
        family_xref: tag.value.clone(),
        pedigree: tag.child_value("PEDI").to_string(),
    }
}

fn project_event(tag: &Tag) -> Event {
    let mut event = Event {
        event_type: tag.tag.clone(),
        description: tag.value.clone(),
        ..Event::default()
    };
    for child in &tag.children {
        match child.tag.as_str() {
            "TYPE" => event.event_type_detail = child.value.clone(),
            "DATE" => {
                event.date = child.value.clone();
                event.parsed_date = parse_date_opt(&child.value);
            }
            "PLAC" => {
                event.place = child.value.clone();
                event.place_detail = project_place(child);
            }
            "SOUR" => event.source_citations.push(project_citation(child)),
            _ => {}
        }
    }
    event
}

fn project_attribute(tag: &Tag) -> Attribute {
    let mut attribute = Attribute {
        attribute_type: tag.tag.clone(),
        value: tag.value.clone(),
        ..Attribute::default()
    };
    for child in &tag.children {
        match child.tag.as_str() {
            "DATE" => {
                attribute.date = child.value.clone();
                attribute.parsed_date = parse_date_opt(&child.value);
            }
            "PLAC" => attribute.place = child.value.clone(),
            "SOUR" => attribute.source_citations.push(project_citation(child)),
            _ => {}
        }
    }
    attribute
}

fn project_citation(tag: &Tag) -> SourceCitation {
    SourceCitation {
        source_xref: tag.value.clone(),
        page: tag.child_value("PAGE").to_string(),
        text: tag
            .find("DATA")
            .map(|data| data.child_value("TEXT").to_string())
            .unwrap_or_default(),
    }
}

/// Raw dates are kept even when unparseable; the validator reports the
/// failure.
fn parse_date_opt(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Date::parse(trimmed).ok()
}

fn project_place(tag: &Tag) -> Option<PlaceDetail> {
    if tag.find("FORM").is_none() && tag.find("MAP").is_none() {
        return None;
    }
    let coordinates = tag.find("MAP").map(|map| Coordinates {
        latitude: map.child_value("LATI").to_string(),
        longitude: map.child_value("LONG").to_string(),
    });
    Some(PlaceDetail {
        name: tag.value.clone(),
        form: tag.child_value("FORM").to_string(),
        coordinates,
    })
}

/// Joins CONT (line break) and CONC (concatenation) children onto a
/// text value.
fn assemble_text(initial: &str, children: &[Tag]) -> String {
    let mut text = initial.to_string();
    for child in children {
        match child.tag.as_str() {
            "CONT" => {
                text.push('\n');
                text.push_str(&child.value);
            }
            "CONC" => text.push_str(&child.value),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("John /Smith/"), ("John".to_string(), "Smith".to_string()));
        assert_eq!(split_name("John /Smith/ Jr"), ("John".to_string(), "Smith".to_string()));
        assert_eq!(split_name("/Smith/"), (String::new(), "Smith".to_string()));
        assert_eq!(split_name("John"), ("John".to_string(), String::new()));
        assert_eq!(split_name("John /Smith"), ("John".to_string(), "Smith".to_string()));
    }

    #[test]
    fn test_assemble_text() {
        let children = vec![
            Tag { tag: "CONC".to_string(), value: " continued".to_string(), ..Tag::default() },
            Tag { tag: "CONT".to_string(), value: "next line".to_string(), ..Tag::default() },
            Tag { tag: "SOUR".to_string(), value: "@S1@".to_string(), ..Tag::default() },
        ];
        assert_eq!(assemble_text("start", &children), "start continued\nnext line");
    }
}
