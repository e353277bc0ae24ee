//! The force-field aggregate: defaults plus keyed parameter tables.

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::declared::{Declared, Override, PassthroughBlock};
use crate::diagnostics::Diagnostic;
use crate::project::SourceMap;
use crate::schema::{AngleTypeParams, AtomType, Defaults, PairTypeParams, SectionKind};

/// Key of a type-table entry.
///
/// Bonded keys are order-normalized, so `A B` and `B A` name the same
/// entry, as do `A B C` and `C B A`. The function code is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeKey {
    pub types: Vec<SmolStr>,
    pub func: Option<u8>,
}

impl TypeKey {
    pub fn name(name: impl Into<SmolStr>) -> Self {
        Self {
            types: vec![name.into()],
            func: None,
        }
    }

    pub fn bonded<I, S>(types: I, func: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let mut types: Vec<SmolStr> = types.into_iter().map(Into::into).collect();
        if types.first() > types.last() {
            types.reverse();
        }
        Self {
            types,
            func: Some(func),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.types.join(" "))?;
        if let Some(func) = self.func {
            write!(f, " (func {func})")?;
        }
        Ok(())
    }
}

pub type Table<T> = IndexMap<TypeKey, Declared<T>>;

/// Every force-field declaration reachable from the entry file.
///
/// Tables keep first-declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceField {
    pub defaults: Option<Declared<Defaults>>,
    pub atom_types: Table<AtomType>,
    pub nonbond_params: Table<PairTypeParams>,
    pub pair_types: Table<PairTypeParams>,
    pub bond_types: Table<PairTypeParams>,
    pub angle_types: Table<AngleTypeParams>,
    pub constraint_types: Table<PairTypeParams>,
    /// Unregistered sections met outside any molecule type.
    pub extra: Vec<Declared<PassthroughBlock>>,
    /// Conflicting declarations the override policy let through.
    pub overrides: Vec<Override>,
    pub sources: SourceMap,
}

impl ForceField {
    pub fn atom_type(&self, name: &str) -> Option<&AtomType> {
        self.atom_types
            .get(&TypeKey::name(name))
            .map(|declared| &declared.value)
    }

    pub fn nonbond_param(&self, ai: &str, aj: &str, func: u8) -> Option<&PairTypeParams> {
        self.nonbond_params
            .get(&TypeKey::bonded([ai, aj], func))
            .map(|declared| &declared.value)
    }

    pub fn bond_type(&self, ai: &str, aj: &str, func: u8) -> Option<&PairTypeParams> {
        self.bond_types
            .get(&TypeKey::bonded([ai, aj], func))
            .map(|declared| &declared.value)
    }

    pub fn angle_type(&self, ai: &str, aj: &str, ak: &str, func: u8) -> Option<&AngleTypeParams> {
        self.angle_types
            .get(&TypeKey::bonded([ai, aj, ak], func))
            .map(|declared| &declared.value)
    }

    /// Number of entries over all tables.
    pub fn len(&self) -> usize {
        usize::from(self.defaults.is_some())
            + self.atom_types.len()
            + self.nonbond_params.len()
            + self.pair_types.len()
            + self.bond_types.len()
            + self.angle_types.len()
            + self.constraint_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// One `W0001` warning per applied override.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.overrides.iter().map(Override::to_diagnostic).collect()
    }
}

fn write_table<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: SectionKind,
    table: &Table<T>,
) -> fmt::Result {
    if table.is_empty() {
        return Ok(());
    }
    writeln!(f, "[ {kind} ]")?;
    for declared in table.values() {
        writeln!(f, "{}", declared.value)?;
    }
    writeln!(f)
}

/// Writes a self-contained force-field `.itp`.
impl fmt::Display for ForceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(defaults) = &self.defaults {
            writeln!(f, "[ {} ]", SectionKind::Defaults)?;
            writeln!(f, "{}\n", defaults.value)?;
        }
        write_table(f, SectionKind::AtomTypes, &self.atom_types)?;
        write_table(f, SectionKind::NonbondParams, &self.nonbond_params)?;
        write_table(f, SectionKind::PairTypes, &self.pair_types)?;
        write_table(f, SectionKind::BondTypes, &self.bond_types)?;
        write_table(f, SectionKind::AngleTypes, &self.angle_types)?;
        write_table(f, SectionKind::ConstraintTypes, &self.constraint_types)?;
        for block in &self.extra {
            writeln!(f, "{}", block.value)?;
        }
        Ok(())
    }
}
