use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use super::{FileSystem, OsFileSystem};
use crate::config::ParseConfig;
use crate::error::Result;
use crate::topology::Topology;

/// What the loader materializes after the shallow parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pulls {
    pub forcefield: bool,
    pub molecule_types: bool,
}

impl Pulls {
    pub const NONE: Pulls = Pulls {
        forcefield: false,
        molecule_types: false,
    };
    pub const ALL: Pulls = Pulls {
        forcefield: true,
        molecule_types: true,
    };
}

/// Loads many independent topologies in parallel.
///
/// Every topology gets its own resolution; nothing is shared between
/// them but the file-system accessor and the configuration.
pub struct TopologyLoader {
    fs: Arc<dyn FileSystem>,
    config: ParseConfig,
    pulls: Pulls,
}

impl TopologyLoader {
    /// Reads the real file system with [`ParseConfig::from_env`], the same
    /// configuration [`Topology::parse`] uses.
    pub fn new() -> Self {
        Self {
            fs: Arc::new(OsFileSystem),
            config: ParseConfig::from_env(),
            pulls: Pulls::NONE,
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pulls(mut self, pulls: Pulls) -> Self {
        self.pulls = pulls;
        self
    }

    /// Load one topology.
    pub fn load_one(&self, path: &Path) -> Result<Topology> {
        let mut topology = Topology::parse_with(self.fs.clone(), path, self.config.clone())?;
        if self.pulls.forcefield {
            topology.pull_forcefield()?;
        }
        if self.pulls.molecule_types {
            topology.pull_molecule_types()?;
        }
        Ok(topology)
    }

    /// Load every path in parallel. Results come back in input order, one
    /// per path; a failing topology does not affect the others.
    pub fn load(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<Topology>)> {
        let results: Vec<_> = paths
            .par_iter()
            .map(|path| (path.clone(), self.load_one(path)))
            .collect();

        let failed = results.iter().filter(|(_, result)| result.is_err()).count();
        tracing::debug!(total = results.len(), failed, "batch load finished");
        results
    }
}

impl Default for TopologyLoader {
    fn default() -> Self {
        Self::new()
    }
}
