//! The topology composite.
//!
//! A [`Topology`] starts from a shallow parse of the entry `.top` file:
//! the system name and the molecule composition are read, includes are
//! recorded but not followed. The force field and the molecule types are
//! materialized on demand by the pull operations, each of which resolves
//! the full include graph afresh.
//!
//! ```text
//! Topology::parse ──▶ ShallowParsed ──pull_forcefield──────▶ PartiallyMaterialized
//!                                   ──pull_molecule_types──▶ (binds [ molecules ])
//! ```
//!
//! A failing pull returns every diagnostic it found and leaves the
//! topology exactly as it was.

mod assemble;
mod declared;
mod forcefield;
mod molecule_type;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use declared::{Declared, Override, PassthroughBlock};
pub use forcefield::{ForceField, Table, TypeKey};
pub use molecule_type::{MoleculeType, MoleculeTypes};

use crate::config::ParseConfig;
use crate::diagnostics::{DiagnosticCollector, Location};
use crate::error::{Error, Result};
use crate::project::{FileSystem, InclusionEdge, IncludeResolver, OsFileSystem, SourceMap};
use crate::schema::{MoleculeCount, Record, SectionKind};
use crate::section::sections;

/// Where a topology is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Only the entry file's own declarations are known.
    ShallowParsed,
    /// At least one aggregate category has been pulled.
    PartiallyMaterialized {
        forcefield: bool,
        molecule_types: bool,
    },
}

/// A GROMACS topology.
pub struct Topology {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    config: ParseConfig,
    system: String,
    molecules: Vec<Declared<MoleculeCount>>,
    includes: Vec<InclusionEdge>,
    sources: SourceMap,
    forcefield: Option<ForceField>,
    molecule_types: Option<MoleculeTypes>,
}

impl Topology {
    /// Shallow-parse `path` from disk. System includes are searched in
    /// the directories listed by `GMXLIB`.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_with(Arc::new(OsFileSystem), path, ParseConfig::from_env())
    }

    /// Shallow-parse `path`: read the entry file only and capture its
    /// `[ system ]` and `[ molecules ]`.
    ///
    /// Fails on a missing mandatory section, an empty system name, or a
    /// malformed line in either section.
    pub fn parse_with(
        fs: Arc<dyn FileSystem>,
        path: impl AsRef<Path>,
        config: ParseConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let scanned = IncludeResolver::new(fs.as_ref(), &config).scan(&path)?;

        let mut diagnostics = DiagnosticCollector::new();
        let mut system: Option<Vec<String>> = None;
        let mut molecules: Option<Vec<Declared<MoleculeCount>>> = None;
        for section in sections(&scanned.lines) {
            match section.kind {
                SectionKind::System => {
                    system.get_or_insert_with(Vec::new);
                }
                SectionKind::Molecules => {
                    molecules.get_or_insert_with(Vec::new);
                }
                _ => continue,
            }
            for failure in &section.failures {
                diagnostics.syntax_failure(&scanned.sources, failure);
            }
            for entry in section.entries {
                match entry.record {
                    Record::System(name) => system.get_or_insert_with(Vec::new).push(name.0),
                    Record::Molecule(count) => molecules
                        .get_or_insert_with(Vec::new)
                        .push(Declared::new(count, entry.origin)),
                    _ => {}
                }
            }
        }
        diagnostics.finish(())?;

        let system = system
            .map(|lines| lines.join(" "))
            .filter(|name| !name.is_empty());
        let Some(system) = system else {
            return Err(Error::MissingMandatory {
                path,
                field: "'[ system ]' name",
            });
        };
        let Some(molecules) = molecules else {
            return Err(Error::MissingMandatory {
                path,
                field: "'[ molecules ]' section",
            });
        };

        tracing::debug!(
            path = %path.display(),
            system = %system,
            molecules = molecules.len(),
            includes = scanned.edges.len(),
            "topology shallow-parsed"
        );
        Ok(Self {
            path,
            fs,
            config,
            system,
            molecules,
            includes: scanned.edges,
            sources: scanned.sources,
            forcefield: None,
            molecule_types: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// The system name; multi-line names are joined with single spaces.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The composition, in declaration order. Names may repeat.
    pub fn molecules(&self) -> impl Iterator<Item = &MoleculeCount> {
        self.molecules.iter().map(|declared| &declared.value)
    }

    /// Include directives written in the entry file, as written.
    pub fn includes(&self) -> &[InclusionEdge] {
        &self.includes
    }

    pub fn state(&self) -> State {
        match (&self.forcefield, &self.molecule_types) {
            (None, None) => State::ShallowParsed,
            (forcefield, molecule_types) => State::PartiallyMaterialized {
                forcefield: forcefield.is_some(),
                molecule_types: molecule_types.is_some(),
            },
        }
    }

    pub fn forcefield(&self) -> Option<&ForceField> {
        self.forcefield.as_ref()
    }

    pub fn molecule_types(&self) -> Option<&MoleculeTypes> {
        self.molecule_types.as_ref()
    }

    /// Resolve the include graph and materialize the force field,
    /// replacing any earlier pull.
    #[tracing::instrument(level = "debug", skip(self), fields(entry = %self.path.display()))]
    pub fn pull_forcefield(&mut self) -> Result<&ForceField> {
        let resolved = IncludeResolver::new(self.fs.as_ref(), &self.config).resolve(&self.path)?;
        let forcefield = assemble::forcefield(&resolved, self.config.override_policy)?;
        Ok(self.forcefield.insert(forcefield))
    }

    /// Resolve the include graph, materialize the molecule types and bind
    /// every `[ molecules ]` entry to its definition, replacing any
    /// earlier pull.
    ///
    /// A composition name no molecule type defines is a reference failure
    /// reported here, not at shallow-parse time.
    #[tracing::instrument(level = "debug", skip(self), fields(entry = %self.path.display()))]
    pub fn pull_molecule_types(&mut self) -> Result<&MoleculeTypes> {
        let resolved = IncludeResolver::new(self.fs.as_ref(), &self.config).resolve(&self.path)?;
        let (molecule_types, mut diagnostics) =
            assemble::molecule_types(&resolved, self.config.override_policy);
        self.bind(&molecule_types, &mut diagnostics);
        tracing::debug!(
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "molecule types checked"
        );
        let molecule_types = diagnostics.finish(molecule_types)?;
        Ok(self.molecule_types.insert(molecule_types))
    }

    /// Report every composition name `molecule_types` does not define.
    fn bind(&self, molecule_types: &MoleculeTypes, diagnostics: &mut DiagnosticCollector) {
        for declared in &self.molecules {
            if !molecule_types.contains(&declared.value.name) {
                diagnostics.undefined_reference(
                    "molecule type",
                    &declared.value.name,
                    Location::of(&self.sources, declared.origin),
                );
            }
        }
    }

    /// Drop every pulled aggregate; back to [`State::ShallowParsed`].
    pub fn release(&mut self) {
        self.forcefield = None;
        self.molecule_types = None;
    }

    /// Each composition entry with its molecule type, in composition
    /// order. `None` until the molecule types have been pulled.
    pub fn bound_molecules(&self) -> Option<Vec<(&MoleculeType, u32)>> {
        let molecule_types = self.molecule_types.as_ref()?;
        Some(
            self.molecules()
                .filter_map(|entry| {
                    molecule_types
                        .get(&entry.name)
                        .map(|molecule| (molecule, entry.count))
                })
                .collect(),
        )
    }

    /// Total number of atoms in the system, once molecule types are pulled.
    pub fn atom_count(&self) -> Option<usize> {
        let bound = self.bound_molecules()?;
        Some(
            bound
                .iter()
                .map(|(molecule, count)| molecule.atoms.len() * *count as usize)
                .sum(),
        )
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("path", &self.path)
            .field("system", &self.system)
            .field("molecules", &self.molecules)
            .field("includes", &self.includes)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Writes the entry-file view: includes, `[ system ]` and `[ molecules ]`.
impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in &self.includes {
            if edge.system {
                writeln!(f, "#include <{}>", edge.reference)?;
            } else {
                writeln!(f, "#include \"{}\"", edge.reference)?;
            }
        }
        if !self.includes.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "[ {} ]", SectionKind::System)?;
        writeln!(f, "{}\n", self.system)?;
        writeln!(f, "[ {} ]", SectionKind::Molecules)?;
        for molecule in self.molecules() {
            writeln!(f, "{molecule}")?;
        }
        Ok(())
    }
}
