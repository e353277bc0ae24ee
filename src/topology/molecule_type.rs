//! The molecule-type aggregate.

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::declared::{Declared, Override, PassthroughBlock};
use crate::diagnostics::Diagnostic;
use crate::project::SourceMap;
use crate::schema::{
    Angle, Atom, Dihedral, Exclusion, Link, MoleculeTypeHeader, PositionRestraint, Record,
    SectionKind, Settle,
};

/// One `[ moleculetype ]` and every body section up to the next one.
///
/// Repeated body sections of one kind are concatenated in stream order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoleculeType {
    pub name: SmolStr,
    pub nrexcl: u32,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Link>,
    pub pairs: Vec<Link>,
    pub angles: Vec<Angle>,
    pub dihedrals: Vec<Dihedral>,
    pub constraints: Vec<Link>,
    pub exclusions: Vec<Exclusion>,
    pub settles: Vec<Settle>,
    pub position_restraints: Vec<PositionRestraint>,
    /// Unregistered sections inside this molecule type, e.g. virtual sites.
    pub extra: Vec<PassthroughBlock>,
}

impl MoleculeType {
    pub fn new(header: MoleculeTypeHeader) -> Self {
        Self {
            name: header.name,
            nrexcl: header.nrexcl,
            atoms: Vec::new(),
            bonds: Vec::new(),
            pairs: Vec::new(),
            angles: Vec::new(),
            dihedrals: Vec::new(),
            constraints: Vec::new(),
            exclusions: Vec::new(),
            settles: Vec::new(),
            position_restraints: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Attach one body record.
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Atom(atom) => self.atoms.push(atom),
            Record::Bond(bond) => self.bonds.push(bond),
            Record::Pair(pair) => self.pairs.push(pair),
            Record::Angle(angle) => self.angles.push(angle),
            Record::Dihedral(dihedral) => self.dihedrals.push(dihedral),
            Record::Constraint(constraint) => self.constraints.push(constraint),
            Record::Exclusion(exclusion) => self.exclusions.push(exclusion),
            Record::Settle(settle) => self.settles.push(settle),
            Record::PositionRestraint(posres) => self.position_restraints.push(posres),
            other => tracing::debug!(record = %other, "not a molecule body record"),
        }
    }

    /// Body section kinds holding at least one record.
    pub fn section_kinds(&self) -> Vec<SectionKind> {
        [
            (SectionKind::Atoms, self.atoms.len()),
            (SectionKind::Bonds, self.bonds.len()),
            (SectionKind::Pairs, self.pairs.len()),
            (SectionKind::Angles, self.angles.len()),
            (SectionKind::Dihedrals, self.dihedrals.len()),
            (SectionKind::Constraints, self.constraints.len()),
            (SectionKind::Exclusions, self.exclusions.len()),
            (SectionKind::Settles, self.settles.len()),
            (SectionKind::PositionRestraints, self.position_restraints.len()),
        ]
        .into_iter()
        .filter(|(_, len)| *len > 0)
        .map(|(kind, _)| kind)
        .collect()
    }

    pub fn total_charge(&self) -> f64 {
        self.atoms.iter().map(|atom| atom.charge).sum()
    }

    /// Every atom index referenced by a body record that no `[ atoms ]`
    /// line declares, with the kind of the referencing section.
    pub fn dangling_atom_references(&self) -> Vec<(SectionKind, u32)> {
        let declared: rustc_hash::FxHashSet<u32> = self.atoms.iter().map(|atom| atom.id).collect();
        let mut dangling = Vec::new();
        let mut check = |kind, ids: &[u32]| {
            for &id in ids {
                if !declared.contains(&id) {
                    dangling.push((kind, id));
                }
            }
        };
        for link in &self.bonds {
            check(SectionKind::Bonds, &[link.ai, link.aj]);
        }
        for link in &self.pairs {
            check(SectionKind::Pairs, &[link.ai, link.aj]);
        }
        for angle in &self.angles {
            check(SectionKind::Angles, &[angle.ai, angle.aj, angle.ak]);
        }
        for dihedral in &self.dihedrals {
            check(
                SectionKind::Dihedrals,
                &[dihedral.ai, dihedral.aj, dihedral.ak, dihedral.al],
            );
        }
        for link in &self.constraints {
            check(SectionKind::Constraints, &[link.ai, link.aj]);
        }
        for exclusion in &self.exclusions {
            check(SectionKind::Exclusions, &[exclusion.atom]);
            check(SectionKind::Exclusions, &exclusion.excluded);
        }
        for settle in &self.settles {
            check(SectionKind::Settles, &[settle.ow]);
        }
        for posres in &self.position_restraints {
            check(SectionKind::PositionRestraints, &[posres.ai]);
        }
        dangling
    }
}

fn write_body<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: SectionKind,
    records: &[T],
) -> fmt::Result {
    if records.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n[ {kind} ]")?;
    for record in records {
        writeln!(f, "{record}")?;
    }
    Ok(())
}

/// Writes the molecule type as an `.itp` fragment.
impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ {} ]", SectionKind::MoleculeType)?;
        let header = MoleculeTypeHeader {
            name: self.name.clone(),
            nrexcl: self.nrexcl,
        };
        writeln!(f, "{header}")?;
        write_body(f, SectionKind::Atoms, &self.atoms)?;
        write_body(f, SectionKind::Bonds, &self.bonds)?;
        write_body(f, SectionKind::Pairs, &self.pairs)?;
        write_body(f, SectionKind::Angles, &self.angles)?;
        write_body(f, SectionKind::Dihedrals, &self.dihedrals)?;
        write_body(f, SectionKind::Constraints, &self.constraints)?;
        write_body(f, SectionKind::Exclusions, &self.exclusions)?;
        write_body(f, SectionKind::Settles, &self.settles)?;
        write_body(f, SectionKind::PositionRestraints, &self.position_restraints)?;
        for block in &self.extra {
            write!(f, "\n{block}")?;
        }
        Ok(())
    }
}

/// Every molecule type reachable from the entry file, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeTypes {
    pub types: IndexMap<SmolStr, Declared<MoleculeType>>,
    pub overrides: Vec<Override>,
    pub sources: SourceMap,
}

impl MoleculeTypes {
    pub fn get(&self, name: &str) -> Option<&MoleculeType> {
        self.types.get(name).map(|declared| &declared.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(SmolStr::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoleculeType> {
        self.types.values().map(|declared| &declared.value)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
    /// One `W0001` warning per applied override.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.overrides.iter().map(Override::to_diagnostic).collect()
    }
}

impl fmt::Display for MoleculeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, molecule) in self.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{molecule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Fields, Interaction};

    fn water() -> MoleculeType {
        let mut water = MoleculeType::new(MoleculeTypeHeader {
            name: "SOL".into(),
            nrexcl: 2,
        });
        for line in ["1 OW 1 SOL OW 1 -0.834", "2 HW 1 SOL HW1 1 0.417", "3 HW 1 SOL HW2 1 0.417"] {
            water.push(Record::Atom(Atom::parse(&mut Fields::new(line)).unwrap()));
        }
        water.push(Record::Settle(Settle {
            ow: 1,
            func: 1,
            doh: 0.09572,
            dhh: 0.15139,
        }));
        water
    }

    #[test]
    fn test_push_routes_by_kind() {
        let water = water();
        assert_eq!(water.atoms.len(), 3);
        assert_eq!(water.section_kinds(), vec![SectionKind::Atoms, SectionKind::Settles]);
        assert!(water.total_charge().abs() < 1e-12);
    }

    #[test]
    fn test_dangling_atom_references() {
        let mut water = water();
        assert!(water.dangling_atom_references().is_empty());
        water.push(Record::Bond(Link {
            ai: 1,
            aj: 4,
            interaction: Interaction::new(1, vec![]),
        }));
        assert_eq!(water.dangling_atom_references(), vec![(SectionKind::Bonds, 4)]);
    }

    #[test]
    fn test_display_lists_sections() {
        let text = water().to_string();
        assert!(text.starts_with("[ moleculetype ]\n"));
        assert!(text.contains("\n[ atoms ]\n"));
        assert!(text.contains("\n[ settles ]\n"));
        assert!(!text.contains("[ bonds ]"));
    }
}
