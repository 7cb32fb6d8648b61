//! Optional post-checks run by the decoder: structural framing,
//! cross-reference resolution, and strict-mode tag policy.

use crate::error::DecodeError;
use crate::model::Document;
use crate::parser::Line;

/// A well-formed file is framed by a level-0 HEAD at the start and a
/// level-0 TRLR at the end.
pub(crate) fn check_structure(lines: &[Line]) -> Vec<DecodeError> {
    if lines.is_empty() {
        return vec![DecodeError::MissingHeader { line: 0, context: String::new() }];
    }

    let mut has_head = false;
    let mut has_trlr = false;
    for line in lines {
        if line.level != 0 {
            continue;
        }
        if line.tag == "HEAD" {
            has_head = true;
        }
        if line.tag == "TRLR" {
            has_trlr = true;
        }
    }

    let mut errors = Vec::new();
    if !has_head {
        let first = &lines[0];
        errors.push(DecodeError::MissingHeader {
            line: first.line_number,
            context: first.to_string(),
        });
    }
    if !has_trlr {
        let last = &lines[lines.len() - 1];
        errors.push(DecodeError::MissingTrailer {
            line: last.line_number,
            context: last.to_string(),
        });
    }

    errors
}

/// Tags starting with `_` are vendor extensions; strict mode reports
/// every one.
pub(crate) fn check_strict_tags(lines: &[Line]) -> Vec<DecodeError> {
    lines
        .iter()
        .filter(|line| line.tag.starts_with('_'))
        .map(|line| DecodeError::NonStandardTag {
            line: line.line_number,
            tag: line.tag.clone(),
            context: line.to_string(),
        })
        .collect()
}

/// Reports every xref-shaped tag value with no matching record.
/// `@VOID@` means intentionally unresolved and is skipped.
pub(crate) fn check_xrefs(doc: &Document) -> Vec<DecodeError> {
    let mut errors = Vec::new();
    for record in &doc.records {
        for tag in record.walk() {
            if !is_xref_value(&tag.value) {
                continue;
            }
            if doc.get_record(&tag.value).is_some() {
                continue;
            }
            errors.push(DecodeError::BrokenXRef {
                xref: tag.value.clone(),
                line: tag.line_number,
                tag: tag.tag.clone(),
                record_xref: record.xref.clone(),
                context: format!("{} {}", tag.tag, tag.value).trim().to_string(),
            });
        }
    }
    errors
}

fn is_xref_value(value: &str) -> bool {
    value.len() >= 3 && value.starts_with('@') && value.ends_with('@') && value != "@VOID@"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_xref_value() {
        assert!(is_xref_value("@I1@"));
        assert!(!is_xref_value("@VOID@"));
        assert!(!is_xref_value("@@"));
        assert!(!is_xref_value("John /Smith/"));
        assert!(!is_xref_value(""));
    }

    #[test]
    fn test_check_structure_empty_input() {
        let errors = check_structure(&[]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DecodeError::MissingHeader { line: 0, .. }));
    }

    #[test]
    fn test_check_structure_reports_both_ends() {
        let lines = vec![Line {
            level: 0,
            tag: "INDI".to_string(),
            xref: "@I1@".to_string(),
            line_number: 1,
            ..Line::default()
        }];
        let errors = check_structure(&lines);
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], DecodeError::MissingHeader { line: 1, context } if context == "0 @I1@ INDI"));
        assert!(matches!(&errors[1], DecodeError::MissingTrailer { line: 1, .. }));
    }
}
