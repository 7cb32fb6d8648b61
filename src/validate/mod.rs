//! Semantic validation for assembled documents.
//!
//! Runs after decoding and reports issues the decoder cannot see on a
//! single line: tags that do not belong to the declared dialect,
//! non-standard record identifiers, malformed dates, and circular
//! family relationships. Issues are advisory; the validator never
//! mutates the document and never fails.

mod circular;

use std::fmt;

use crate::model::{Date, Document, Version};

/// Issue codes, stable strings for machine consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    DeprecatedTag,
    NonStandardXRef,
    InvalidDate,
    CircularReference,
}

impl IssueCode {
    /// Returns the code string (e.g. "DEPRECATED_TAG").
    pub fn code(&self) -> &'static str {
        match self {
            IssueCode::DeprecatedTag => "DEPRECATED_TAG",
            IssueCode::NonStandardXRef => "NON_STANDARD_XREF",
            IssueCode::InvalidDate => "INVALID_DATE",
            IssueCode::CircularReference => "CIRCULAR_REFERENCE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    pub line: Option<usize>,
    pub xref: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

/// Validates a document, returning all issues found.
pub fn validate(doc: &Document) -> Vec<Issue> {
    Validator::new().validate(doc)
}

/// Semantic validator. Collects issues append-only across its rule set.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every rule against the document and returns the issues in
    /// rule order, source order within each rule.
    pub fn validate(mut self, doc: &Document) -> Vec<Issue> {
        self.check_version_rules(doc);
        self.check_xref_formats(doc);
        self.check_dates(doc);
        circular::check_circular_relationships(doc, &mut self.issues);
        self.issues
    }

    /// Tags outside the declared dialect. An unknown or missing version
    /// skips the check.
    fn check_version_rules(&mut self, doc: &Document) {
        let version = doc.version();
        let Some(deprecated) = deprecated_tags(version) else {
            return;
        };

        for record in &doc.records {
            if let Some(reason) = lookup(deprecated, record.record_type.tag()) {
                self.issues.push(Issue {
                    code: IssueCode::DeprecatedTag,
                    message: format!(
                        "Tag {} is not valid in GEDCOM {version}: {reason}",
                        record.record_type.tag()
                    ),
                    line: Some(record.line_number),
                    xref: some_xref(&record.xref),
                });
            }
            for tag in record.walk() {
                if let Some(reason) = lookup(deprecated, &tag.tag) {
                    self.issues.push(Issue {
                        code: IssueCode::DeprecatedTag,
                        message: format!(
                            "Tag {} is not valid in GEDCOM {version}: {reason}",
                            tag.tag
                        ),
                        line: Some(tag.line_number),
                        xref: some_xref(&record.xref),
                    });
                }
            }
        }
    }

    /// Record xrefs should match `@[A-Za-z0-9]+@`; underscores and other
    /// characters in the identifier body are non-standard.
    fn check_xref_formats(&mut self, doc: &Document) {
        for record in &doc.records {
            if record.xref.is_empty() || is_standard_xref(&record.xref) {
                continue;
            }
            self.issues.push(Issue {
                code: IssueCode::NonStandardXRef,
                message: format!("Non-standard XRef format {}", record.xref),
                line: Some(record.line_number),
                xref: some_xref(&record.xref),
            });
        }
    }

    /// Every DATE value must parse and form a legal calendar date.
    fn check_dates(&mut self, doc: &Document) {
        for record in &doc.records {
            for tag in record.walk() {
                if tag.tag != "DATE" {
                    continue;
                }
                let value = tag.value.trim();
                if value.is_empty() {
                    continue;
                }
                match Date::parse(value) {
                    Err(_) => self.issues.push(Issue {
                        code: IssueCode::InvalidDate,
                        message: format!("Invalid date {value:?}"),
                        line: Some(tag.line_number),
                        xref: None,
                    }),
                    Ok(date) => {
                        if let Err(e) = date.validate() {
                            self.issues.push(Issue {
                                code: IssueCode::InvalidDate,
                                message: format!("Invalid date {value:?}: {e}"),
                                line: Some(tag.line_number),
                                xref: None,
                            });
                        }
                    }
                }
            }
        }
    }
}

fn some_xref(xref: &str) -> Option<String> {
    if xref.is_empty() {
        None
    } else {
        Some(xref.to_string())
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], tag: &str) -> Option<&'static str> {
    table.iter().find(|(name, _)| *name == tag).map(|&(_, reason)| reason)
}

/// Tags forbidden under each dialect.
fn deprecated_tags(version: Version) -> Option<&'static [(&'static str, &'static str)]> {
    const V55: &[(&str, &str)] = &[
        ("UID", "introduced in GEDCOM 7.0"),
        ("CREA", "introduced in GEDCOM 7.0"),
        ("MIME", "introduced in GEDCOM 7.0"),
    ];
    const V70: &[(&str, &str)] = &[
        ("AFN", "deprecated in GEDCOM 7.0"),
        ("EMAIL", "deprecated in GEDCOM 7.0"),
        ("FAX", "deprecated in GEDCOM 7.0"),
        ("RFN", "deprecated in GEDCOM 7.0"),
        ("REFN", "deprecated in GEDCOM 7.0"),
        ("RIN", "deprecated in GEDCOM 7.0"),
        ("WWW", "deprecated in GEDCOM 7.0"),
    ];

    match version {
        Version::V5_5 | Version::V5_5_1 => Some(V55),
        Version::V7_0 => Some(V70),
        Version::Unknown => None,
    }
}

fn is_standard_xref(xref: &str) -> bool {
    let bytes = xref.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'@' || bytes[bytes.len() - 1] != b'@' {
        return false;
    }
    bytes[1..bytes.len() - 1]
        .iter()
        .all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn decode_str(input: &str) -> Document {
        decode(input.as_bytes()).unwrap()
    }

    #[test]
    fn test_minimal_document_is_clean() {
        let doc = decode_str("0 HEAD\n1 GEDC\n2 VERS 5.5\n0 TRLR\n");
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn test_deprecated_tag_in_55() {
        let doc = decode_str("0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 UID abc\n0 TRLR\n");
        let issues = validate(&doc);

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.code, IssueCode::DeprecatedTag);
        assert_eq!(issue.code.code(), "DEPRECATED_TAG");
        assert!(issue.message.contains("UID"));
        assert!(issue.message.contains("5.5"));
        assert_eq!(issue.line, Some(5));
        assert_eq!(issue.xref.as_deref(), Some("@I1@"));
    }

    #[test]
    fn test_deprecated_tag_in_70() {
        let doc = decode_str("0 HEAD\n1 GEDC\n2 VERS 7.0\n0 @I1@ INDI\n1 EMAIL a@b.c\n0 TRLR\n");
        let issues = validate(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("EMAIL"));
        assert!(issues[0].message.contains("deprecated in GEDCOM 7.0"));
    }

    #[test]
    fn test_70_tags_fine_in_70() {
        let doc = decode_str("0 HEAD\n1 GEDC\n2 VERS 7.0\n0 @I1@ INDI\n1 UID abc\n0 TRLR\n");
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn test_unknown_version_skips_deprecation() {
        let doc = decode_str("0 HEAD\n0 @I1@ INDI\n1 UID abc\n1 EMAIL a@b.c\n0 TRLR\n");
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn test_deprecated_tag_found_in_nested_subtree() {
        let doc =
            decode_str("0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 BIRT\n2 UID nested\n0 TRLR\n");
        let issues = validate(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, Some(6));
    }

    #[test]
    fn test_non_standard_xref() {
        let doc = decode_str("0 HEAD\n0 @I_1@ INDI\n0 TRLR\n");
        let issues = validate(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::NonStandardXRef);
        assert_eq!(issues[0].xref.as_deref(), Some("@I_1@"));
    }

    #[test]
    fn test_invalid_dates_reported() {
        let doc = decode_str(
            "0 HEAD\n0 @I1@ INDI\n1 BIRT\n2 DATE not a date\n1 DEAT\n2 DATE 30 FEB 1900\n0 TRLR\n",
        );
        let issues = validate(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code == IssueCode::InvalidDate));
        assert_eq!(issues[0].line, Some(4));
        assert_eq!(issues[1].line, Some(6));
    }

    #[test]
    fn test_empty_date_not_reported() {
        let doc = decode_str("0 HEAD\n0 @I1@ INDI\n1 BIRT\n2 DATE\n0 TRLR\n");
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn test_is_standard_xref() {
        assert!(is_standard_xref("@I1@"));
        assert!(is_standard_xref("@ABC123@"));
        assert!(!is_standard_xref("@I_1@"));
        assert!(!is_standard_xref("@@"));
        assert!(!is_standard_xref("I1"));
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue {
            code: IssueCode::DeprecatedTag,
            message: "Tag UID is not valid in GEDCOM 5.5: introduced in GEDCOM 7.0".to_string(),
            line: Some(5),
            xref: Some("@I1@".to_string()),
        };
        assert_eq!(
            issue.to_string(),
            "[DEPRECATED_TAG] Tag UID is not valid in GEDCOM 5.5: introduced in GEDCOM 7.0 (line 5)"
        );
    }
}
