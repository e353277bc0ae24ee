//! Record schemas: one typed record per kind of data line.
//!
//! Each [`SectionKind`] owns a record layout. The [`registry`] maps header
//! labels to kinds and kinds to parsers, so the schema a line is read with
//! is always picked by the section it sits in:
//!
//! ```text
//! "[ atomtypes ]" ──lookup──▶ SectionKind::AtomTypes ──parser──▶ Record::AtomType
//! ```

mod error;
mod fields;
mod forcefield;
pub mod interaction;
mod molecule;
mod registry;
mod system;

use std::fmt;

pub use error::RecordError;
pub use fields::{Field, Fields};
pub use forcefield::{AngleTypeParams, AtomType, Defaults, PairTypeParams, ParticleType};
pub use interaction::Interaction;
pub use molecule::{
    Angle, Atom, AtomStateB, Dihedral, Exclusion, Link, MoleculeTypeHeader, PositionRestraint, Settle,
};
pub use registry::{ParseFn, Registry, registry};
pub use system::{MoleculeCount, SystemName};

use crate::syntax::{LineClass, classify};

/// Which aggregate a section contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Type tables merged into the force field.
    ForceField,
    /// Opens a new molecule type.
    MoleculeHeader,
    /// Belongs to the currently open molecule type.
    MoleculeBody,
    /// `[ system ]` and `[ molecules ]`.
    Composition,
    /// Kept verbatim.
    Passthrough,
}

/// Every section kind the parser tells apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
    Defaults,
    AtomTypes,
    NonbondParams,
    PairTypes,
    BondTypes,
    AngleTypes,
    ConstraintTypes,
    MoleculeType,
    Atoms,
    Bonds,
    Pairs,
    Angles,
    Dihedrals,
    Constraints,
    Exclusions,
    Settles,
    PositionRestraints,
    System,
    Molecules,
    /// A header label no schema is registered for.
    Opaque,
    /// Lines before the first header of a stream.
    Preamble,
}

impl SectionKind {
    /// Canonical (lower-case) header label.
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Defaults => "defaults",
            SectionKind::AtomTypes => "atomtypes",
            SectionKind::NonbondParams => "nonbond_params",
            SectionKind::PairTypes => "pairtypes",
            SectionKind::BondTypes => "bondtypes",
            SectionKind::AngleTypes => "angletypes",
            SectionKind::ConstraintTypes => "constrainttypes",
            SectionKind::MoleculeType => "moleculetype",
            SectionKind::Atoms => "atoms",
            SectionKind::Bonds => "bonds",
            SectionKind::Pairs => "pairs",
            SectionKind::Angles => "angles",
            SectionKind::Dihedrals => "dihedrals",
            SectionKind::Constraints => "constraints",
            SectionKind::Exclusions => "exclusions",
            SectionKind::Settles => "settles",
            SectionKind::PositionRestraints => "position_restraints",
            SectionKind::System => "system",
            SectionKind::Molecules => "molecules",
            SectionKind::Opaque => "opaque",
            SectionKind::Preamble => "preamble",
        }
    }

    pub fn category(self) -> Category {
        match self {
            SectionKind::Defaults
            | SectionKind::AtomTypes
            | SectionKind::NonbondParams
            | SectionKind::PairTypes
            | SectionKind::BondTypes
            | SectionKind::AngleTypes
            | SectionKind::ConstraintTypes => Category::ForceField,
            SectionKind::MoleculeType => Category::MoleculeHeader,
            SectionKind::Atoms
            | SectionKind::Bonds
            | SectionKind::Pairs
            | SectionKind::Angles
            | SectionKind::Dihedrals
            | SectionKind::Constraints
            | SectionKind::Exclusions
            | SectionKind::Settles
            | SectionKind::PositionRestraints => Category::MoleculeBody,
            SectionKind::System | SectionKind::Molecules => Category::Composition,
            SectionKind::Opaque | SectionKind::Preamble => Category::Passthrough,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One validated data line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Record {
    Defaults(Defaults),
    AtomType(AtomType),
    NonbondParam(PairTypeParams),
    PairType(PairTypeParams),
    BondType(PairTypeParams),
    AngleType(AngleTypeParams),
    ConstraintType(PairTypeParams),
    MoleculeType(MoleculeTypeHeader),
    Atom(Atom),
    Bond(Link),
    Pair(Link),
    Angle(Angle),
    Dihedral(Dihedral),
    Constraint(Link),
    Exclusion(Exclusion),
    Settle(Settle),
    PositionRestraint(PositionRestraint),
    System(SystemName),
    Molecule(MoleculeCount),
    /// A line of a passthrough section, comment stripped and trimmed.
    Raw(String),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Defaults(r) => fmt::Display::fmt(r, f),
            Record::AtomType(r) => fmt::Display::fmt(r, f),
            Record::NonbondParam(r)
            | Record::PairType(r)
            | Record::BondType(r)
            | Record::ConstraintType(r) => fmt::Display::fmt(r, f),
            Record::AngleType(r) => fmt::Display::fmt(r, f),
            Record::MoleculeType(r) => fmt::Display::fmt(r, f),
            Record::Atom(r) => fmt::Display::fmt(r, f),
            Record::Bond(r) | Record::Pair(r) | Record::Constraint(r) => fmt::Display::fmt(r, f),
            Record::Angle(r) => fmt::Display::fmt(r, f),
            Record::Dihedral(r) => fmt::Display::fmt(r, f),
            Record::Exclusion(r) => fmt::Display::fmt(r, f),
            Record::Settle(r) => fmt::Display::fmt(r, f),
            Record::PositionRestraint(r) => fmt::Display::fmt(r, f),
            Record::System(r) => fmt::Display::fmt(r, f),
            Record::Molecule(r) => fmt::Display::fmt(r, f),
            Record::Raw(line) => f.write_str(line),
        }
    }
}

/// Parse one raw line with the schema of `kind`.
///
/// Blank and comment-only lines yield `Ok(None)`. Lines of passthrough
/// kinds come back as [`Record::Raw`].
pub fn parse_line(kind: SectionKind, raw: &str) -> Result<Option<Record>, RecordError> {
    match classify(raw) {
        LineClass::Blank => Ok(None),
        LineClass::Malformed(err) => Err(err.into()),
        LineClass::Header(_) | LineClass::Directive(_) => Err(RecordError::NotData(raw.trim().to_string())),
        LineClass::Data(content) => match registry().parser(kind) {
            Some(parse) => {
                let mut fields = Fields::new(content);
                let record = parse(&mut fields)?;
                fields.finish()?;
                Ok(Some(record))
            }
            None => Ok(Some(Record::Raw(content.to_string()))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_atomtype() {
        let record = parse_line(SectionKind::AtomTypes, "P5 72.0 0.000 A 0.0 0.0").unwrap();
        let Some(Record::AtomType(p5)) = record else {
            panic!("expected an atom type");
        };
        assert_eq!(p5.name, "P5");
        assert_eq!(p5.atomic_number, None);
    }

    #[test]
    fn test_parse_line_comment_only_yields_nothing() {
        assert_eq!(parse_line(SectionKind::Atoms, "  ; id type resnr"), Ok(None));
        assert_eq!(parse_line(SectionKind::Atoms, ""), Ok(None));
    }

    #[test]
    fn test_parse_line_strips_trailing_comment() {
        let record = parse_line(SectionKind::Molecules, "DOPC 2 ; lipids").unwrap();
        assert_eq!(record, Some(Record::Molecule(MoleculeCount::new("DOPC", 2))));
    }

    #[test]
    fn test_parse_line_fixed_arity_rejects_extra_tokens() {
        assert_eq!(
            parse_line(SectionKind::Molecules, "DOPC 2 3"),
            Err(RecordError::ExtraData("3".to_string()))
        );
    }

    #[test]
    fn test_parse_line_passthrough() {
        assert_eq!(
            parse_line(SectionKind::Opaque, "  1 2 3 4 1 ; vsite"),
            Ok(Some(Record::Raw("1 2 3 4 1".to_string())))
        );
    }

    #[test]
    fn test_parse_line_rejects_structural_lines() {
        assert!(matches!(
            parse_line(SectionKind::Atoms, "[ bonds ]"),
            Err(RecordError::NotData(_))
        ));
        assert!(matches!(
            parse_line(SectionKind::Atoms, "[ bonds"),
            Err(RecordError::Line(_))
        ));
    }

    #[test]
    fn test_category_of_kinds() {
        assert_eq!(SectionKind::AtomTypes.category(), Category::ForceField);
        assert_eq!(SectionKind::MoleculeType.category(), Category::MoleculeHeader);
        assert_eq!(SectionKind::Dihedrals.category(), Category::MoleculeBody);
        assert_eq!(SectionKind::Molecules.category(), Category::Composition);
        assert_eq!(SectionKind::Opaque.category(), Category::Passthrough);
    }
}
