//! Mapping between file paths and [`FileId`]s.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::base::{FileId, Origin};

/// Assigns stable ids to the files one resolution reads.
///
/// Ids are handed out in first-visit order, so the entry file is always
/// [`FileId::ENTRY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    paths: IndexSet<PathBuf>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the id for a path.
    pub fn file_id(&mut self, path: &Path) -> FileId {
        let (index, _) = self.paths.insert_full(path.to_owned());
        FileId::new(index as u32)
    }

    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.paths.get_index_of(path).map(|index| FileId::new(index as u32))
    }

    pub fn path(&self, file: FileId) -> Option<&Path> {
        self.paths.get_index(file.index() as usize).map(PathBuf::as_path)
    }

    pub fn entry(&self) -> Option<&Path> {
        self.path(FileId::ENTRY)
    }

    /// `path:line` for an origin, falling back to the raw id.
    pub fn describe(&self, origin: Origin) -> String {
        match self.path(origin.file) {
            Some(path) => format!("{}:{}", path.display(), origin.line),
            None => origin.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
