//! Circular-ancestry detection.
//!
//! Walks parent links (FAMC → HUSB, WIFE) from every individual with a
//! two-color DFS. The `visiting` set marks the current path, `visited`
//! marks fully explored nodes. Both are local to each root: sharing
//! `visited` across roots would suppress legitimate reports when
//! individuals share ancestors.

use rustc_hash::FxHashSet;

use crate::model::{Document, Individual};
use crate::validate::{Issue, IssueCode};

pub(super) fn check_circular_relationships(doc: &Document, issues: &mut Vec<Issue>) {
    for individual in doc.individuals() {
        if individual.xref.is_empty() {
            continue;
        }
        let mut visiting = FxHashSet::default();
        let mut visited = FxHashSet::default();
        if has_circular_ancestry(doc, individual, &individual.xref, &mut visiting, &mut visited) {
            issues.push(Issue {
                code: IssueCode::CircularReference,
                message: format!(
                    "Circular family relationship detected for {}",
                    individual.xref
                ),
                line: None,
                xref: Some(individual.xref.clone()),
            });
        }
    }
}

/// True when some ancestry path from `current` reaches `target` again.
fn has_circular_ancestry<'a>(
    doc: &'a Document,
    current: &'a Individual,
    target: &str,
    visiting: &mut FxHashSet<&'a str>,
    visited: &mut FxHashSet<&'a str>,
) -> bool {
    if current.xref.is_empty() {
        return false;
    }
    if visiting.contains(current.xref.as_str()) {
        return current.xref == target;
    }
    if visited.contains(current.xref.as_str()) {
        return false;
    }

    visiting.insert(current.xref.as_str());
    for parent in current.parents(doc) {
        if parent.xref == target {
            return true;
        }
        if has_circular_ancestry(doc, parent, target, visiting, visited) {
            return true;
        }
    }
    visiting.remove(current.xref.as_str());
    visited.insert(current.xref.as_str());

    false
}

#[cfg(test)]
mod tests {
    use crate::decoder::decode;
    use crate::validate::{validate, IssueCode};

    #[test]
    fn test_mutual_parent_families_flagged() {
        // F1 makes I1 the parent of I2; F2 makes I2 the parent of I1.
        let input = "0 HEAD\n\
                     0 @I1@ INDI\n1 FAMC @F2@\n1 FAMS @F1@\n\
                     0 @I2@ INDI\n1 FAMC @F1@\n1 FAMS @F2@\n\
                     0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
                     0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I1@\n\
                     0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let issues = validate(&doc);

        let circular: Vec<_> = issues
            .iter()
            .filter(|i| i.code == IssueCode::CircularReference)
            .collect();
        assert_eq!(circular.len(), 2);
        assert_eq!(circular[0].xref.as_deref(), Some("@I1@"));
        assert_eq!(circular[1].xref.as_deref(), Some("@I2@"));
    }

    #[test]
    fn test_individual_outside_cycle_not_flagged() {
        // I3 descends from the I1/I2 cycle but is not on it.
        let input = "0 HEAD\n\
                     0 @I1@ INDI\n1 FAMC @F2@\n1 FAMS @F1@\n\
                     0 @I2@ INDI\n1 FAMC @F1@\n1 FAMS @F2@\n\
                     0 @I3@ INDI\n1 FAMC @F3@\n\
                     0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
                     0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I1@\n\
                     0 @F3@ FAM\n1 HUSB @I1@\n1 CHIL @I3@\n\
                     0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        let issues = validate(&doc);

        let circular: Vec<_> = issues
            .iter()
            .filter(|i| i.code == IssueCode::CircularReference)
            .collect();
        assert_eq!(circular.len(), 2);
        assert!(circular.iter().all(|i| i.xref.as_deref() != Some("@I3@")));
    }

    #[test]
    fn test_normal_tree_not_flagged() {
        let input = "0 HEAD\n\
                     0 @I1@ INDI\n1 FAMS @F1@\n\
                     0 @I2@ INDI\n1 FAMS @F1@\n\
                     0 @I3@ INDI\n1 FAMC @F1@\n\
                     0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n\
                     0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        assert!(validate(&doc).is_empty());
    }

    #[test]
    fn test_shared_ancestors_not_flagged() {
        // Cousin marriage: shared grandparents, no cycle.
        let input = "0 HEAD\n\
                     0 @G1@ INDI\n1 FAMS @F0@\n\
                     0 @P1@ INDI\n1 FAMC @F0@\n1 FAMS @F1@\n\
                     0 @P2@ INDI\n1 FAMC @F0@\n1 FAMS @F2@\n\
                     0 @C1@ INDI\n1 FAMC @F1@\n\
                     0 @C2@ INDI\n1 FAMC @F2@\n\
                     0 @F0@ FAM\n1 HUSB @G1@\n1 CHIL @P1@\n1 CHIL @P2@\n\
                     0 @F1@ FAM\n1 HUSB @P1@\n1 CHIL @C1@\n\
                     0 @F2@ FAM\n1 HUSB @P2@\n1 CHIL @C2@\n\
                     0 TRLR\n";
        let doc = decode(input.as_bytes()).unwrap();
        assert!(validate(&doc).is_empty());
    }
}
