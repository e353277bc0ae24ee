//! Source positions of logical lines.

use std::fmt;

use super::FileId;

/// Where a logical line came from.
///
/// Lines are 1-indexed, the way GROMACS and editors report them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Origin {
    pub file: FileId,
    pub line: u32,
}

impl Origin {
    #[inline]
    pub const fn new(file: FileId, line: u32) -> Self {
        Self { file, line }
    }

    /// Origin of the `index`-th (0-based) line of `file`.
    #[inline]
    pub const fn from_index(file: FileId, index: usize) -> Self {
        Self {
            file,
            line: index as u32 + 1,
        }
    }

    /// Whether the line belongs to the entry file of its resolution.
    #[inline]
    pub const fn in_entry_file(self) -> bool {
        self.file.is_entry()
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_from_index_is_one_based() {
        let origin = Origin::from_index(FileId::new(1), 0);
        assert_eq!(origin.line, 1);
        assert_eq!(origin.to_string(), "file#1:1");
    }

    #[test]
    fn test_origin_ordering_follows_file_then_line() {
        let a = Origin::new(FileId::new(0), 9);
        let b = Origin::new(FileId::new(1), 1);
        assert!(a < b);
        assert!(a.in_entry_file());
        assert!(!b.in_entry_file());
    }
}
