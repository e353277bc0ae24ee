//! # moltopol-base
//!
//! Core library for reading GROMACS topology, include and coordinate files
//! into typed records, and writing them back.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! topology → Topology composite: shallow parse, pulls, composition binding
//!   ↓
//! project  → File systems, include resolution, batch loading
//!   ↓
//! section  → Section routing and per-section record parsing
//!   ↓
//! schema   → Record layouts and the section-kind registry
//!   ↓
//! syntax   → Line classification (comments, headers, directives)
//!   ↓
//! base     → Primitives (FileId, Origin)
//! ```
//!
//! `coords` (the `.gro` format) sits beside the topology stack and only
//! shares the diagnostics and error types.
//!
//! ## Example
//!
//! ```no_run
//! use moltopol::Topology;
//!
//! let mut topology = Topology::parse("system.top")?;
//! println!("{}: {} molecule entries", topology.system(), topology.molecules().count());
//!
//! let forcefield = topology.pull_forcefield()?;
//! println!("{} atom types", forcefield.atom_types.len());
//! # Ok::<(), moltopol::Error>(())
//! ```

/// Foundation types: FileId, Origin
pub mod base;

/// Line classification
pub mod syntax;

/// Record schemas and the section-kind registry
pub mod schema;

/// Section routing and parsing
pub mod section;

/// File systems, include resolution, batch loading
pub mod project;

/// The topology composite and its aggregates
pub mod topology;

/// Coordinate files
pub mod coords;

pub mod config;
pub mod diagnostics;
pub mod error;

pub use base::{FileId, Origin};
pub use config::{OverridePolicy, ParseConfig};
pub use coords::{GroFile, parse_gro, read_gro};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Location, Severity};
pub use error::{Error, Result};
pub use project::{
    FileSystem, IncludeResolver, MemoryFileSystem, OsFileSystem, Pulls, ResolutionError,
    TopologyLoader,
};
pub use schema::{Record, RecordError, SectionKind};
pub use section::Section;
pub use topology::{ForceField, MoleculeType, MoleculeTypes, State, Topology};
