//! Decoding GEDCOM byte streams into [`Document`]s.
//!
//! The decoder re-presents the input as UTF-8, parses it line by line,
//! reconstructs the record tree with a level-indexed parent stack,
//! builds the cross-reference index, projects typed entities, and runs
//! the optional post-checks configured in [`DecodeOptions`].
//!
//! ```rust
//! use gedcom::decode;
//!
//! let input = b"0 HEAD\n1 GEDC\n2 VERS 5.5\n0 TRLR\n";
//! let doc = decode(&input[..]).unwrap();
//! assert_eq!(doc.records.len(), 2);
//! ```

mod checks;
mod project;

use std::io::Read;

use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::encoding;
use crate::error::{DecodeError, DecodeErrors};
use crate::limits::MAX_NESTING_DEPTH;
use crate::model::{Document, Record, RecordType, Tag};
use crate::parser::{Line, Parser};

/// Configuration for [`decode_with_options`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Maximum allowed nesting depth (default 100).
    pub max_nesting_depth: usize,
    /// Reject non-standard `_`-prefixed extension tags.
    pub strict_mode: bool,
    /// Continue past errors, aggregating them alongside the document.
    pub recover_errors: bool,
    /// Report tag values that reference missing records.
    pub validate_xrefs: bool,
    /// Require HEAD and TRLR framing records.
    pub validate_structure: bool,
    /// Polled between records and between passes; on cancellation the
    /// decode returns [`DecodeError::Cancelled`].
    pub cancellation: CancellationToken,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: MAX_NESTING_DEPTH,
            strict_mode: false,
            recover_errors: false,
            validate_xrefs: false,
            validate_structure: false,
            cancellation: CancellationToken::new(),
        }
    }
}

/// Decodes a GEDCOM byte stream with default options, failing on the
/// first error.
pub fn decode<R: Read>(reader: R) -> Result<Document, DecodeError> {
    decode_with_options(reader, &DecodeOptions::default()).map(|(doc, _)| doc)
}

/// Decodes a GEDCOM byte stream.
///
/// With `recover_errors` set, every error is collected in source order
/// and the most complete document possible is returned alongside them.
/// Otherwise the first error aborts. I/O failures on `reader` are
/// always fatal.
pub fn decode_with_options<R: Read>(
    mut reader: R,
    options: &DecodeOptions,
) -> Result<(Document, DecodeErrors), DecodeError> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|source| DecodeError::Read { line: 0, source })?;

    let text = encoding::to_utf8(&raw);
    tracing::debug!(
        encoding = encoding::detected_name(&raw),
        bytes = raw.len(),
        "decoding input"
    );

    let mut parser = Parser::new();
    parser.set_max_nesting_depth(options.max_nesting_depth);

    let mut errors: Vec<DecodeError> = Vec::new();
    let lines = if options.recover_errors {
        let (lines, parse_errors) = parser.parse_with_recovery(text.as_bytes());
        if !parse_errors.is_empty() {
            tracing::debug!(count = parse_errors.len(), "recovered from parse errors");
        }
        errors.extend(parse_errors.into_iter().map(DecodeError::from));
        lines
    } else {
        parser.parse(text.as_bytes())?
    };

    if options.validate_structure {
        errors.append(&mut checks::check_structure(&lines));
    }
    if options.strict_mode {
        errors.append(&mut checks::check_strict_tags(&lines));
    }

    if options.cancellation.is_cancelled() {
        return Err(cancelled(Vec::new(), options));
    }

    let records = match assemble(&lines, options) {
        Ok(records) => records,
        Err(e) => return Err(e),
    };

    if options.cancellation.is_cancelled() {
        return Err(cancelled(records, options));
    }

    let (xref_index, mut duplicate_errors) = build_xref_index(&records);
    errors.append(&mut duplicate_errors);

    let mut records = records;
    for record in &mut records {
        project::project(record);
    }

    let header = records
        .iter()
        .find(|r| r.record_type == RecordType::Header)
        .map(project::project_header);
    if let Some(header) = &header {
        tracing::debug!(version = %header.version, records = records.len(), "assembled document");
    }

    let document = Document {
        header,
        records,
        xref_index,
    };

    if options.validate_xrefs {
        errors.append(&mut checks::check_xrefs(&document));
    }

    if !options.recover_errors && !errors.is_empty() {
        return Err(errors.remove(0));
    }

    Ok((document, DecodeErrors { errors }))
}

/// A record under construction: its finished direct children plus the
/// stack of currently open tags, one per level.
struct OpenRecord {
    record: Record,
    stack: Vec<Tag>,
}

impl OpenRecord {
    fn new(line: &Line) -> Self {
        Self {
            record: Record {
                xref: line.xref.clone(),
                record_type: RecordType::from_tag(&line.tag),
                value: line.value.clone(),
                tags: Vec::new(),
                line_number: line.line_number,
                entity: Default::default(),
            },
            stack: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &Line) {
        // The parser guarantees levels grow by at most one, so the new
        // tag's parent is always on the stack once deeper tags close.
        let level = line.level.min(self.stack.len() + 1);
        while self.stack.len() >= level {
            self.close_deepest();
        }
        self.stack.push(Tag::from_line(line));
    }

    fn close_deepest(&mut self) {
        let Some(tag) = self.stack.pop() else { return };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(tag),
            None => self.record.tags.push(tag),
        }
    }

    fn finish(mut self) -> Record {
        while !self.stack.is_empty() {
            self.close_deepest();
        }
        self.record
    }
}

fn assemble(lines: &[Line], options: &DecodeOptions) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::new();
    let mut open: Option<OpenRecord> = None;

    for line in lines {
        if line.level == 0 {
            if let Some(prev) = open.take() {
                records.push(prev.finish());
            }
            if options.cancellation.is_cancelled() {
                return Err(cancelled(records, options));
            }
            open = Some(OpenRecord::new(line));
        } else if let Some(open) = open.as_mut() {
            // Lines before the first level-0 record have no parent and
            // are dropped.
            open.push_line(line);
        }
    }
    if let Some(prev) = open.take() {
        records.push(prev.finish());
    }

    Ok(records)
}

/// Maps each record xref to its position. Duplicates keep the first
/// mapping and report a [`DecodeError::DuplicateXRef`].
fn build_xref_index(records: &[Record]) -> (FxHashMap<String, usize>, Vec<DecodeError>) {
    let mut index = FxHashMap::default();
    let mut errors = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if record.xref.is_empty() {
            continue;
        }
        match index.entry(record.xref.clone()) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(i);
            }
            std::collections::hash_map::Entry::Occupied(existing) => {
                errors.push(DecodeError::DuplicateXRef {
                    xref: record.xref.clone(),
                    first_line: records[*existing.get()].line_number,
                    line: record.line_number,
                });
            }
        }
    }

    (index, errors)
}

fn cancelled(records: Vec<Record>, options: &DecodeOptions) -> DecodeError {
    if !options.recover_errors {
        return DecodeError::Cancelled { partial: None };
    }
    let (xref_index, _) = build_xref_index(&records);
    DecodeError::Cancelled {
        partial: Some(Box::new(Document {
            header: None,
            records,
            xref_index,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Version};
    use proptest::prelude::*;

    fn recover_options() -> DecodeOptions {
        DecodeOptions {
            recover_errors: true,
            ..DecodeOptions::default()
        }
    }

    #[test]
    fn test_decode_minimal_document() {
        let input = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();

        assert_eq!(doc.records.len(), 2);
        assert_eq!(doc.version(), Version::V5_5);
        assert_eq!(doc.individuals().count(), 0);
    }

    #[test]
    fn test_decode_builds_entities_and_index() {
        let input = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
                     0 @I1@ INDI\n1 NAME John /Smith/\n2 GIVN John\n2 SURN Smith\n1 SEX M\n\
                     1 BIRT\n2 DATE 12 JAN 1900\n2 PLAC London, England\n3 FORM city, country\n\
                     3 MAP\n4 LATI N51.5\n4 LONG W0.12\n\
                     1 FAMS @F1@\n\
                     0 @I2@ INDI\n1 NAME Mary /Jones/\n1 FAMS @F1@\n\
                     0 @I3@ INDI\n1 NAME Junior /Smith/\n1 FAMC @F1@\n\
                     0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 MARR\n2 DATE ABT 1898\n\
                     0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();

        assert_eq!(doc.version(), Version::V5_5_1);
        assert_eq!(doc.individuals().count(), 3);
        assert_eq!(doc.families().count(), 1);

        let john = doc.get_individual("@I1@").unwrap();
        assert_eq!(john.names[0].full, "John /Smith/");
        assert_eq!(john.names[0].given, "John");
        assert_eq!(john.names[0].surname, "Smith");
        assert_eq!(john.sex, "M");
        assert_eq!(john.spouse_in_families[0].family_xref, "@F1@");

        let birth = &john.events[0];
        assert_eq!(birth.event_type, "BIRT");
        assert_eq!(birth.date, "12 JAN 1900");
        let parsed = birth.parsed_date.as_ref().unwrap();
        assert_eq!((parsed.day, parsed.month, parsed.year), (12, 1, 1900));
        assert_eq!(birth.place, "London, England");
        let detail = birth.place_detail.as_ref().unwrap();
        assert_eq!(detail.form, "city, country");
        let coords = detail.coordinates.as_ref().unwrap();
        assert_eq!(coords.latitude, "N51.5");
        assert_eq!(coords.longitude, "W0.12");

        let family = doc.get_family("@F1@").unwrap();
        assert_eq!(family.husband, "@I1@");
        assert_eq!(family.wife, "@I2@");
        assert_eq!(family.children, ["@I3@"]);
        assert_eq!(family.events[0].event_type, "MARR");

        let junior = doc.get_individual("@I3@").unwrap();
        let parents = junior.parents(&doc);
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].xref, "@I1@");
        assert_eq!(parents[1].xref, "@I2@");
    }

    #[test]
    fn test_tag_levels_match_depth() {
        let input = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 BIRT\n2 PLAC x\n3 FORM y\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();

        fn check(tag: &Tag, depth: usize) {
            assert_eq!(tag.level, depth, "tag {} at wrong depth", tag.tag);
            for child in &tag.children {
                check(child, depth + 1);
            }
        }
        for record in &doc.records {
            for tag in &record.tags {
                check(tag, 1);
            }
        }
    }

    #[test]
    fn test_line_numbers_strictly_increase() {
        let input = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 BIRT\n2 DATE 1900\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();

        let mut last = 0;
        for record in &doc.records {
            assert!(record.line_number > last);
            last = record.line_number;
            for tag in record.walk() {
                assert!(tag.line_number > last);
                last = tag.line_number;
            }
        }
    }

    #[test]
    fn test_xref_index_points_back_at_record() {
        let input = "0 HEAD\n0 @I1@ INDI\n0 @F1@ FAM\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        for record in &doc.records {
            if record.xref.is_empty() {
                continue;
            }
            let found = doc.get_record(&record.xref).unwrap();
            assert_eq!(found.line_number, record.line_number);
        }
    }

    #[test]
    fn test_decode_recovery_keeps_valid_records() {
        let input = "0 HEAD\nINVALID\n0 TRLR\n";
        let (doc, errors) = decode_with_options(input.as_bytes(), &recover_options()).unwrap();

        assert_eq!(doc.records.len(), 2);
        assert_eq!(doc.records[0].record_type, RecordType::Header);
        assert_eq!(doc.records[1].record_type, RecordType::Trailer);
        assert_eq!(errors.len(), 1);
        match &errors.errors[0] {
            DecodeError::Parse(e) => assert_eq!(e.context, "prev: 0 HEAD | line: INVALID"),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn test_decode_strict_aborts_on_bad_line() {
        let input = "0 HEAD\nINVALID\n0 TRLR\n";
        let err = decode(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
    }

    #[test]
    fn test_duplicate_xref_first_wins() {
        let input = "0 HEAD\n0 @I1@ INDI\n1 SEX M\n0 @I1@ INDI\n1 SEX F\n0 TRLR\n";
        let (doc, errors) = decode_with_options(input.as_bytes(), &recover_options()).unwrap();

        assert_eq!(errors.len(), 1);
        match &errors.errors[0] {
            DecodeError::DuplicateXRef { xref, first_line, line } => {
                assert_eq!(xref, "@I1@");
                assert_eq!(*first_line, 2);
                assert_eq!(*line, 4);
            }
            other => panic!("expected DuplicateXRef, got {other}"),
        }
        assert_eq!(doc.get_individual("@I1@").unwrap().sex, "M");
    }

    #[test]
    fn test_broken_xref_reported() {
        let input = "0 HEAD\n0 @F1@ FAM\n1 HUSB @I99@\n0 TRLR\n";
        let options = DecodeOptions {
            validate_xrefs: true,
            ..DecodeOptions::default()
        };
        let err = decode_with_options(input.as_bytes(), &options).unwrap_err();
        match err {
            DecodeError::BrokenXRef { xref, tag, record_xref, line, .. } => {
                assert_eq!(xref, "@I99@");
                assert_eq!(tag, "HUSB");
                assert_eq!(record_xref, "@F1@");
                assert_eq!(line, 3);
            }
            other => panic!("expected BrokenXRef, got {other}"),
        }
    }

    #[test]
    fn test_void_xref_not_broken() {
        let input = "0 HEAD\n0 @F1@ FAM\n1 HUSB @VOID@\n0 TRLR\n";
        let options = DecodeOptions {
            validate_xrefs: true,
            ..DecodeOptions::default()
        };
        let (_, errors) = decode_with_options(input.as_bytes(), &options).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_structure_validation() {
        let options = DecodeOptions {
            validate_structure: true,
            recover_errors: true,
            ..DecodeOptions::default()
        };

        let (_, errors) = decode_with_options("0 @I1@ INDI\n".as_bytes(), &options).unwrap();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors.errors[0], DecodeError::MissingHeader { .. }));
        assert!(matches!(errors.errors[1], DecodeError::MissingTrailer { .. }));

        let (_, errors) =
            decode_with_options("0 HEAD\n0 TRLR\n".as_bytes(), &options).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_strict_mode_flags_extension_tags() {
        let input = "0 HEAD\n0 @I1@ INDI\n1 _CUSTOM yes\n0 TRLR\n";
        let options = DecodeOptions {
            strict_mode: true,
            recover_errors: true,
            ..DecodeOptions::default()
        };
        let (_, errors) = decode_with_options(input.as_bytes(), &options).unwrap();
        assert_eq!(errors.len(), 1);
        match &errors.errors[0] {
            DecodeError::NonStandardTag { tag, line, .. } => {
                assert_eq!(tag, "_CUSTOM");
                assert_eq!(*line, 3);
            }
            other => panic!("expected NonStandardTag, got {other}"),
        }
    }

    #[test]
    fn test_line_ending_portability() {
        let lf = decode("0 HEAD\n0 TRLR\n".as_bytes()).unwrap();
        let crlf = decode("0 HEAD\r\n0 TRLR\r\n".as_bytes()).unwrap();
        let cr = decode("0 HEAD\r0 TRLR\r".as_bytes()).unwrap();

        assert_eq!(lf, crlf);
        assert_eq!(lf, cr);
        assert_eq!(lf.records.len(), 2);
    }

    #[test]
    fn test_utf16_input_decoded() {
        let text = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 TRLR\n";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let doc = decode(&bytes[..]).unwrap();
        assert_eq!(doc.version(), Version::V5_5);
    }

    #[test]
    fn test_cancellation() {
        let options = DecodeOptions::default();
        options.cancellation.cancel();
        let err = decode_with_options("0 HEAD\n0 TRLR\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(err, DecodeError::Cancelled { partial: None }));

        let options = recover_options();
        options.cancellation.cancel();
        let err = decode_with_options("0 HEAD\n0 TRLR\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(err, DecodeError::Cancelled { .. }));
    }

    #[test]
    fn test_note_continuation() {
        let input = "0 HEAD\n0 @N1@ NOTE First part\n1 CONC  and more\n1 CONT Second line\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let note = doc.get_note("@N1@").unwrap();
        assert_eq!(note.full_text(), "First part and more\nSecond line");
    }

    #[test]
    fn test_source_projection() {
        let input = "0 HEAD\n0 @S1@ SOUR\n1 TITL Parish register\n1 AUTH Rev. Brown\n\
                     1 PUBL London 1901\n1 TEXT Baptisms\n2 CONT 1890-1900\n\
                     1 CHAN\n2 DATE 1 JAN 2000\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let source = doc.get_source("@S1@").unwrap();
        assert_eq!(source.title, "Parish register");
        assert_eq!(source.author, "Rev. Brown");
        assert_eq!(source.publication, "London 1901");
        assert_eq!(source.text, "Baptisms\n1890-1900");
        assert_eq!(source.change_date, "1 JAN 2000");
    }

    #[test]
    fn test_citation_projection() {
        let input = "0 HEAD\n0 @I1@ INDI\n1 SOUR @S1@\n2 PAGE p. 14\n2 DATA\n3 TEXT quoted\n\
                     0 @S1@ SOUR\n1 TITL Register\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let indi = doc.get_individual("@I1@").unwrap();
        let citation = &indi.source_citations[0];
        assert_eq!(citation.source_xref, "@S1@");
        assert_eq!(citation.page, "p. 14");
        assert_eq!(citation.text, "quoted");
    }

    #[test]
    fn test_unknown_record_type_kept() {
        let input = "0 HEAD\n0 @X1@ _LOC Somewhere\n0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let record = doc.get_record("@X1@").unwrap();
        assert_eq!(record.record_type, RecordType::Other("_LOC".to_string()));
        assert_eq!(record.value, "Somewhere");
        assert_eq!(record.entity, Entity::None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn decode_with_recovery_never_panics(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let _ = decode_with_options(&data[..], &recover_options());
        }

        #[test]
        fn decode_with_recovery_never_panics_on_ascii_lines(
            data in "[ -~\\r\\n]{0,512}"
        ) {
            let _ = decode_with_options(data.as_bytes(), &recover_options());
        }
    }
}
