//! Slicing a logical line stream into `(header, body)` groups.

use smol_str::SmolStr;

use crate::base::Origin;
use crate::schema::{SectionKind, registry};
use crate::syntax::{LineClass, LogicalLine};

/// A section header as written, with the kind the registry maps it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The label as declared in text, case preserved.
    pub label: SmolStr,
    pub kind: SectionKind,
}

/// One contiguous run of lines under a header.
///
/// `header` is `None` for the preamble, the lines before the first header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'a> {
    pub header: Option<Header>,
    /// Where the header line sits; for the preamble, its first line.
    pub origin: Origin,
    pub body: &'a [LogicalLine],
}

impl Group<'_> {
    pub fn kind(&self) -> SectionKind {
        self.header
            .as_ref()
            .map_or(SectionKind::Preamble, |header| header.kind)
    }

    /// The label as written, or `"preamble"`.
    pub fn label(&self) -> &str {
        self.header
            .as_ref()
            .map_or(SectionKind::Preamble.label(), |header| header.label.as_str())
    }
}

/// Split `lines` at every well-formed header.
///
/// Repeated labels produce separate groups; nothing is merged here. A
/// preamble group is emitted only when it holds at least one line.
/// Malformed header lines stay in the body of the enclosing group, where
/// the section parser reports them.
pub fn route(lines: &[LogicalLine]) -> Vec<Group<'_>> {
    let registry = registry();
    let mut groups = Vec::new();
    let mut open: Option<(Option<Header>, Origin, usize)> = None;

    for (idx, line) in lines.iter().enumerate() {
        let LineClass::Header(label) = line.class() else {
            if open.is_none() {
                open = Some((None, line.origin, idx));
            }
            continue;
        };
        if let Some((header, origin, start)) = open.take() {
            groups.push(Group {
                header,
                origin,
                body: &lines[start..idx],
            });
        }
        let kind = registry.lookup(label);
        tracing::trace!(label, %kind, origin = %line.origin, "section");
        open = Some((
            Some(Header {
                label: SmolStr::new(label),
                kind,
            }),
            line.origin,
            idx + 1,
        ));
    }

    if let Some((header, origin, start)) = open {
        groups.push(Group {
            header,
            origin,
            body: &lines[start..],
        });
    }
    groups
}
