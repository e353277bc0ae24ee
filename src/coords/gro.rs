//! The fixed-column `.gro` coordinate format.
//!
//! ```text
//! MD of 2 waters, t= 0.0
//!     6
//!     1WATER  OW1    1   0.126   1.624   1.679  0.1227 -0.0580  0.0434
//!   ...
//!    1.82060   1.82060   1.82060
//! ```

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticCollector, Location, codes};
use crate::error::{Error, Result};

const POSITIONS_ONLY: usize = 44;
const WITH_VELOCITIES: usize = 68;

/// Why one atom or box line could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroLineError {
    #[error("atom line is {0} characters long; expected 44 (positions) or 68 (positions and velocities)")]
    Length(usize),

    #[error("column '{field}': cannot read '{token}' as {expected}")]
    Column {
        field: &'static str,
        token: String,
        expected: &'static str,
    },

    #[error("box line holds {0} values; expected 3 or 9")]
    BoxArity(usize),
}

/// One atom line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroAtom {
    pub resid: u32,
    pub resname: SmolStr,
    pub atom_name: SmolStr,
    pub index: u32,
    /// Position in nm.
    pub position: [f64; 3],
    /// Velocity in nm/ps, when the file carries one.
    pub velocity: Option<[f64; 3]>,
}

impl GroAtom {
    /// Read one atom line. Trailing whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, GroLineError> {
        let line = line.trim_end();
        let len = line.chars().count();
        if len != POSITIONS_ONLY && len != WITH_VELOCITIES {
            return Err(GroLineError::Length(len));
        }
        let velocity = if len == WITH_VELOCITIES {
            Some([
                column(line, 44..52, "vx", "a real number")?,
                column(line, 52..60, "vy", "a real number")?,
                column(line, 60..68, "vz", "a real number")?,
            ])
        } else {
            None
        };
        Ok(Self {
            resid: column(line, 0..5, "resid", "an integer")?,
            resname: text(line, 5..10, "resname")?,
            atom_name: text(line, 10..15, "atom name")?,
            index: column(line, 15..20, "index", "an integer")?,
            position: [
                column(line, 20..28, "x", "a real number")?,
                column(line, 28..36, "y", "a real number")?,
                column(line, 36..44, "z", "a real number")?,
            ],
            velocity,
        })
    }
}

fn slice<'l>(line: &'l str, range: Range<usize>, field: &'static str) -> Result<&'l str, GroLineError> {
    line.get(range).ok_or_else(|| GroLineError::Column {
        field,
        token: line.to_string(),
        expected: "ASCII text in fixed columns",
    })
}

fn text(line: &str, range: Range<usize>, field: &'static str) -> Result<SmolStr, GroLineError> {
    Ok(SmolStr::new(slice(line, range, field)?.trim()))
}

fn column<T: FromStr>(
    line: &str,
    range: Range<usize>,
    field: &'static str,
    expected: &'static str,
) -> Result<T, GroLineError> {
    let token = slice(line, range, field)?.trim();
    token.parse().map_err(|_| GroLineError::Column {
        field,
        token: token.to_string(),
        expected,
    })
}

/// The periodic box, in nm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoxVectors {
    Rectangular([f64; 3]),
    /// `v1(x) v2(y) v3(z) v1(y) v1(z) v2(x) v2(z) v3(x) v3(y)`, in file order.
    Triclinic([f64; 9]),
}

impl BoxVectors {
    pub fn parse(line: &str) -> Result<Self, GroLineError> {
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| GroLineError::Column {
                    field: "box",
                    token: token.to_string(),
                    expected: "a real number",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Ok(diagonal) = <[f64; 3]>::try_from(values.as_slice()) {
            Ok(Self::Rectangular(diagonal))
        } else if let Ok(full) = <[f64; 9]>::try_from(values.as_slice()) {
            Ok(Self::Triclinic(full))
        } else {
            Err(GroLineError::BoxArity(values.len()))
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            Self::Rectangular(values) => values,
            Self::Triclinic(values) => values,
        }
    }

    /// The diagonal `v1(x) v2(y) v3(z)`.
    pub fn diagonal(&self) -> [f64; 3] {
        match *self {
            Self::Rectangular(diagonal) => diagonal,
            Self::Triclinic([x, y, z, ..]) => [x, y, z],
        }
    }
}

/// A `.gro` coordinate file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroFile {
    pub title: String,
    pub atoms: Vec<GroAtom>,
    pub box_vectors: BoxVectors,
}

impl GroFile {
    pub fn has_velocities(&self) -> bool {
        !self.atoms.is_empty() && self.atoms.iter().all(|atom| atom.velocity.is_some())
    }
}

/// Parse `.gro` text; `path` is only used to locate diagnostics.
///
/// Every malformed line is reported, as is a declared atom count that
/// disagrees with the number of atom lines present.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_gro(text: &str, path: impl AsRef<Path>) -> Result<GroFile> {
    let path = path.as_ref();
    let mut diagnostics = DiagnosticCollector::new();
    let lines: Vec<&str> = text.lines().collect();
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);
    let at = |idx: usize| Location::new(path, idx as u32 + 1);
    let syntax = |idx: usize, message: String, line: &str| {
        Diagnostic::error(at(idx), message)
            .with_code(codes::SYNTAX)
            .with_source_line(line)
    };

    let Some(count_line) = lines.get(1).filter(|_| end >= 2) else {
        let idx = end.min(1);
        diagnostics.add(syntax(idx, "missing atom-count line".into(), ""));
        return Err(diagnostics.take().into());
    };
    let declared: usize = match count_line.trim().parse() {
        Ok(declared) => declared,
        Err(_) => {
            diagnostics.add(syntax(1, format!("cannot read '{}' as an atom count", count_line.trim()), *count_line));
            return Err(diagnostics.take().into());
        }
    };

    if end < 3 {
        diagnostics.add(syntax(end, "missing box line".into(), ""));
        return Err(diagnostics.take().into());
    }
    let box_idx = end - 1;
    let atom_lines = &lines[2..box_idx];
    if atom_lines.len() != declared {
        diagnostics.add(
            Diagnostic::error(
                at(1),
                format!(
                    "declared {declared} atoms but found {} atom lines",
                    atom_lines.len()
                ),
            )
            .with_code(codes::ATOM_COUNT_MISMATCH)
            .with_source_line(*count_line),
        );
    }

    let mut atoms = Vec::with_capacity(atom_lines.len());
    for (offset, line) in atom_lines.iter().enumerate() {
        match GroAtom::parse(line) {
            Ok(atom) => atoms.push(atom),
            Err(error) => diagnostics.add(syntax(offset + 2, error.to_string(), *line)),
        }
    }
    let box_vectors = BoxVectors::parse(lines[box_idx]);
    if let Err(error) = &box_vectors {
        diagnostics.add(syntax(box_idx, error.to_string(), lines[box_idx]));
    }

    let gro = match box_vectors {
        Ok(box_vectors) if !diagnostics.has_errors() => GroFile {
            title: lines[0].to_string(),
            atoms,
            box_vectors,
        },
        _ => return Err(diagnostics.take().into()),
    };
    tracing::debug!(atoms = gro.atoms.len(), velocities = gro.has_velocities(), "coordinates read");
    Ok(gro)
}

/// Read and parse a `.gro` file from disk.
pub fn read_gro(path: impl AsRef<Path>) -> Result<GroFile> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let text = std::fs::read_to_string(&path).map_err(|source| Error::io(&path, source))?;
    parse_gro(&text, &path)
}

/// Writes the file in GROMACS fixed columns. Residue and atom numbers
/// wrap at 100000.
impl fmt::Display for GroFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{:>5}", self.atoms.len())?;
        for atom in &self.atoms {
            write!(
                f,
                "{:>5}{:<5}{:>5}{:>5}",
                atom.resid % 100_000,
                atom.resname,
                atom.atom_name,
                atom.index % 100_000
            )?;
            for value in atom.position {
                write!(f, "{value:>8.3}")?;
            }
            if let Some(velocity) = atom.velocity {
                for value in velocity {
                    write!(f, "{value:>8.4}")?;
                }
            }
            writeln!(f)?;
        }
        for value in self.box_vectors.values() {
            write!(f, "{value:>10.5}")?;
        }
        writeln!(f)
    }
}
