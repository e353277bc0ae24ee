//! Line-level syntax shared by topology, include and force-field files.
//!
//! - [`lexer`] - logos lexer for the structural lines (headers, directives)
//! - [`line`] - classification of one physical line

pub mod lexer;
pub mod line;

pub use line::{COMMENT_MARKER, Directive, LineClass, LineError, LogicalLine, classify, strip_comment};
