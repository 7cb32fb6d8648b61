//! Raw record tree: level-0 records and their tag subtrees.

use crate::model::entity::Entity;
use crate::parser::Line;

/// Kind of a top-level record, derived from its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Header,
    Trailer,
    Individual,
    Family,
    Source,
    Repository,
    Note,
    Object,
    Submitter,
    Submission,
    Other(String),
}

impl RecordType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "HEAD" => RecordType::Header,
            "TRLR" => RecordType::Trailer,
            "INDI" => RecordType::Individual,
            "FAM" => RecordType::Family,
            "SOUR" => RecordType::Source,
            "REPO" => RecordType::Repository,
            "NOTE" => RecordType::Note,
            "OBJE" => RecordType::Object,
            "SUBM" => RecordType::Submitter,
            "SUBN" => RecordType::Submission,
            other => RecordType::Other(other.to_string()),
        }
    }

    /// The GEDCOM tag for this record type.
    pub fn tag(&self) -> &str {
        match self {
            RecordType::Header => "HEAD",
            RecordType::Trailer => "TRLR",
            RecordType::Individual => "INDI",
            RecordType::Family => "FAM",
            RecordType::Source => "SOUR",
            RecordType::Repository => "REPO",
            RecordType::Note => "NOTE",
            RecordType::Object => "OBJE",
            RecordType::Submitter => "SUBM",
            RecordType::Submission => "SUBN",
            RecordType::Other(tag) => tag,
        }
    }
}

/// A non-root node in a record subtree. Children are stored top-down;
/// no parent links exist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub level: usize,
    pub tag: String,
    pub value: String,
    pub xref: String,
    pub line_number: usize,
    pub children: Vec<Tag>,
}

impl Tag {
    pub(crate) fn from_line(line: &Line) -> Self {
        Self {
            level: line.level,
            tag: line.tag.clone(),
            value: line.value.clone(),
            xref: line.xref.clone(),
            line_number: line.line_number,
            children: Vec::new(),
        }
    }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Tag> {
        self.children.iter().find(|t| t.tag == tag)
    }

    /// All direct children with the given tag.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.children.iter().filter(move |t| t.tag == tag)
    }

    /// Value of the first direct child with the given tag, or `""`.
    pub fn child_value(&self, tag: &str) -> &str {
        self.find(tag).map(|t| t.value.as_str()).unwrap_or("")
    }
}

/// A top-level (level-0) record with its tag subtree and projected
/// entity. `xref` is empty for HEAD and TRLR.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub xref: String,
    pub record_type: RecordType,
    /// Value on the record's own line (NOTE record text, for example).
    pub value: String,
    /// Direct (level-1) children; deeper tags hang off their `children`.
    pub tags: Vec<Tag>,
    pub line_number: usize,
    /// Type-specific projection, populated by the decoder.
    pub entity: Entity,
}

impl Default for RecordType {
    fn default() -> Self {
        RecordType::Other(String::new())
    }
}

impl Record {
    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.tag == tag)
    }

    /// Pre-order traversal over every tag in the subtree.
    ///
    /// Uses an explicit stack so traversal depth is not bounded by the
    /// call stack.
    pub fn walk(&self) -> TagWalk<'_> {
        TagWalk {
            stack: self.tags.iter().rev().collect(),
        }
    }
}

/// Iterator returned by [`Record::walk`].
pub struct TagWalk<'a> {
    stack: Vec<&'a Tag>,
}

impl<'a> Iterator for TagWalk<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<&'a Tag> {
        let tag = self.stack.pop()?;
        for child in tag.children.iter().rev() {
            self.stack.push(child);
        }
        Some(tag)
    }
}
