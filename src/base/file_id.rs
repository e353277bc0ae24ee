//! File identifiers for tracking files in an inclusion graph.

use std::fmt;

/// An identifier for a file visited during one resolution.
///
/// Ids are handed out in visit order by a [`SourceMap`](crate::project::SourceMap),
/// so the entry file of a resolution is always [`FileId::ENTRY`]. The path
/// itself lives in the source map.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub u32);

impl FileId {
    /// The file a resolution started from.
    pub const ENTRY: FileId = FileId(0);

    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Whether this is the entry file of its resolution.
    #[inline]
    pub const fn is_entry(self) -> bool {
        self.0 == Self::ENTRY.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl From<u32> for FileId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}
