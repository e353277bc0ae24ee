//! Foundation types shared by every layer of the parser.
//!
//! - [`FileId`] - Identifier of a file reached while resolving includes
//! - [`Origin`] - File + 1-based line a logical line came from
//!
//! This module has NO dependencies on other moltopol modules.

mod file_id;
mod origin;

pub use file_id::FileId;
pub use origin::Origin;
