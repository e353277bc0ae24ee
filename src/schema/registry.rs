//! The process-wide table from section labels to record parsers.
//!
//! Built once on first use and read-only afterwards. The section router
//! looks labels up here; the section parser looks parsers up by kind.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::error::RecordError;
use super::fields::Fields;
use super::forcefield::{AngleTypeParams, AtomType, Defaults, PairTypeParams};
use super::molecule::{
    Angle, Atom, Dihedral, Exclusion, Link, MoleculeTypeHeader, PositionRestraint, Settle,
};
use super::system::{MoleculeCount, SystemName};
use super::{Record, SectionKind};

/// Parses the tokens of one data line into a record.
pub type ParseFn = fn(&mut Fields<'_>) -> Result<Record, RecordError>;

#[derive(Debug)]
pub struct Registry {
    by_label: FxHashMap<&'static str, SectionKind>,
    parsers: FxHashMap<SectionKind, ParseFn>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::builtin);

/// The registry of every built-in record schema.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    fn builtin() -> Self {
        let entries: [(SectionKind, ParseFn); 19] = [
            (SectionKind::Defaults, |f| Defaults::parse(f).map(Record::Defaults)),
            (SectionKind::AtomTypes, |f| AtomType::parse(f).map(Record::AtomType)),
            (SectionKind::NonbondParams, |f| {
                PairTypeParams::parse_nonbond(f).map(Record::NonbondParam)
            }),
            (SectionKind::PairTypes, |f| {
                PairTypeParams::parse_pairtype(f).map(Record::PairType)
            }),
            (SectionKind::BondTypes, |f| {
                PairTypeParams::parse_bondtype(f).map(Record::BondType)
            }),
            (SectionKind::AngleTypes, |f| {
                AngleTypeParams::parse(f).map(Record::AngleType)
            }),
            (SectionKind::ConstraintTypes, |f| {
                PairTypeParams::parse_constrainttype(f).map(Record::ConstraintType)
            }),
            (SectionKind::MoleculeType, |f| {
                MoleculeTypeHeader::parse(f).map(Record::MoleculeType)
            }),
            (SectionKind::Atoms, |f| Atom::parse(f).map(Record::Atom)),
            (SectionKind::Bonds, |f| Link::parse_bond(f).map(Record::Bond)),
            (SectionKind::Pairs, |f| Link::parse_pair(f).map(Record::Pair)),
            (SectionKind::Angles, |f| Angle::parse(f).map(Record::Angle)),
            (SectionKind::Dihedrals, |f| Dihedral::parse(f).map(Record::Dihedral)),
            (SectionKind::Constraints, |f| {
                Link::parse_constraint(f).map(Record::Constraint)
            }),
            (SectionKind::Exclusions, |f| Exclusion::parse(f).map(Record::Exclusion)),
            (SectionKind::Settles, |f| Settle::parse(f).map(Record::Settle)),
            (SectionKind::PositionRestraints, |f| {
                PositionRestraint::parse(f).map(Record::PositionRestraint)
            }),
            (SectionKind::System, |f| SystemName::parse(f).map(Record::System)),
            (SectionKind::Molecules, |f| {
                MoleculeCount::parse(f).map(Record::Molecule)
            }),
        ];

        let mut by_label = FxHashMap::default();
        let mut parsers = FxHashMap::default();
        for (kind, parse) in entries {
            by_label.insert(kind.label(), kind);
            parsers.insert(kind, parse);
        }
        Self { by_label, parsers }
    }

    /// Kind registered for a header label; case-insensitive.
    /// Unregistered labels are [`SectionKind::Opaque`].
    pub fn lookup(&self, label: &str) -> SectionKind {
        let label = label.trim().to_ascii_lowercase();
        self.by_label
            .get(label.as_str())
            .copied()
            .unwrap_or(SectionKind::Opaque)
    }

    /// Record parser for a kind; `None` for passthrough kinds.
    pub fn parser(&self, kind: SectionKind) -> Option<ParseFn> {
        self.parsers.get(&kind).copied()
    }

    /// Every registered label.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_label.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}
