//! Sections: routing a line stream into header groups and parsing each
//! group's body with its record schema.

mod parser;
mod router;

pub use parser::{Entry, LineFailure, Section, parse_section, parse_section_str};
pub use router::{Group, Header, route};

use crate::syntax::LogicalLine;

/// Route `lines` and parse every group, in stream order.
pub fn sections(lines: &[LogicalLine]) -> Vec<Section> {
    route(lines).iter().map(Section::from_group).collect()
}
