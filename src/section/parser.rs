//! Parsing the body of one section into records.

use std::fmt;

use smol_str::SmolStr;

use super::router::Group;
use crate::base::{FileId, Origin};
use crate::schema::{Record, RecordError, SectionKind, parse_line};
use crate::syntax::LogicalLine;

/// A record together with the line it was read from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    pub origin: Origin,
    pub record: Record,
}

/// A line that did not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFailure {
    pub origin: Origin,
    /// The raw line, as it appeared in the stream.
    pub text: String,
    pub error: RecordError,
}

impl fmt::Display for LineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (in '{}')", self.origin, self.error, self.text.trim())
    }
}

/// The records of one section, in line order.
///
/// A failing line never aborts the section: it lands in `failures` and
/// the remaining lines are still read. A section with failures is
/// invalid, but its good entries stay inspectable.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// Header label as declared in text.
    pub label: SmolStr,
    pub origin: Origin,
    pub entries: Vec<Entry>,
    pub failures: Vec<LineFailure>,
}

impl Section {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both sections hold the same records, wherever they were read.
    pub fn same_records(&self, other: &Section) -> bool {
        self.kind == other.kind && self.records().eq(other.records())
    }

    pub fn from_group(group: &Group<'_>) -> Self {
        parse_section(group.kind(), group.label(), group.origin, group.body)
    }
}

/// Writes the section back as GROMACS text. The preamble has no header.
impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind != SectionKind::Preamble {
            writeln!(f, "[ {} ]", self.label)?;
        }
        for record in self.records() {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Parse the body lines of a section with the schema of `kind`.
pub fn parse_section(
    kind: SectionKind,
    label: &str,
    origin: Origin,
    body: &[LogicalLine],
) -> Section {
    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for line in body {
        match parse_line(kind, &line.text) {
            Ok(Some(record)) => entries.push(Entry {
                origin: line.origin,
                record,
            }),
            Ok(None) => {}
            Err(error) => failures.push(LineFailure {
                origin: line.origin,
                text: line.text.clone(),
                error,
            }),
        }
    }
    Section {
        kind,
        label: SmolStr::new(label),
        origin,
        entries,
        failures,
    }
}

/// Parse a standalone section body given as text; lines are numbered
/// from 1 in the entry file.
pub fn parse_section_str(kind: SectionKind, body: &str) -> Section {
    let lines: Vec<_> = body
        .lines()
        .enumerate()
        .map(|(idx, text)| LogicalLine::new(text, Origin::from_index(FileId::ENTRY, idx)))
        .collect();
    parse_section(kind, kind.label(), Origin::new(FileId::ENTRY, 0), &lines)
}
