//! Files on disk: file-system access, include resolution and batch loading.

mod fs;
mod loader;
mod resolver;
mod source_map;

pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem, normalize};
pub use loader::{Pulls, TopologyLoader};
pub use resolver::{InclusionEdge, IncludeResolver, ResolutionError, ResolvedSource};
pub use source_map::SourceMap;
