//! Parse configuration.

use std::path::PathBuf;

use smol_str::SmolStr;

/// Environment variable listing the system include directories.
pub const GMXLIB: &str = "GMXLIB";

/// What happens when a name is declared twice with different content.
///
/// Identical re-declarations are always dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverridePolicy {
    /// Every conflicting duplicate is an ambiguity failure.
    Strict,
    /// A later declaration written in the entry file replaces one pulled
    /// in from an include. Any other conflict is an ambiguity failure.
    #[default]
    EntryFileWins,
    /// The later declaration always replaces the earlier one.
    LastWins,
}

/// Options shared by the shallow parse and every pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Macros defined before the entry file is read, as by `-DNAME`.
    pub defines: Vec<(SmolStr, Option<String>)>,
    /// Searched, in order, after the including file's directory.
    pub include_dirs: Vec<PathBuf>,
    pub override_policy: OverridePolicy,
    pub max_include_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            defines: Vec::new(),
            include_dirs: Vec::new(),
            override_policy: OverridePolicy::default(),
            max_include_depth: 64,
        }
    }
}

impl ParseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration plus the include directories listed in `GMXLIB`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(paths) = std::env::var_os(GMXLIB) {
            config
                .include_dirs
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        config
    }

    pub fn define(mut self, name: impl Into<SmolStr>) -> Self {
        self.defines.push((name.into(), None));
        self
    }

    pub fn define_value(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), Some(value.into())));
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}
