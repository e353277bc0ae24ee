//! Grouping routed sections into the force-field and molecule-type
//! aggregates.
//!
//! Sections are walked in resolution order. `[ moleculetype ]` opens a
//! molecule scope; body sections attach to the open molecule until the
//! next `[ moleculetype ]`, or until a force-field or composition section
//! closes the scope. Unregistered sections go to the open molecule, or to
//! the force field when no molecule is open.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::declared::{Assembly, Declared, PassthroughBlock};
use super::forcefield::{ForceField, TypeKey};
use super::molecule_type::{MoleculeType, MoleculeTypes};
use crate::base::Origin;
use crate::config::OverridePolicy;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, codes};
use crate::project::ResolvedSource;
use crate::schema::{Category, Record, SectionKind};
use crate::section::{Section, sections};

/// Report preamble data and the failures of every section `in_scope`
/// selects.
fn report_failures(assembly: &mut Assembly<'_>, sections: &[Section], in_scope: impl Fn(&Section) -> bool) {
    for section in sections {
        if section.kind == SectionKind::Preamble {
            for entry in &section.entries {
                let location = assembly.location(entry.origin);
                assembly.diagnostics.add(
                    Diagnostic::error(location, "data line outside any section")
                        .with_code(codes::SYNTAX)
                        .with_source_line(entry.record.to_string()),
                );
            }
        } else if in_scope(section) {
            for failure in &section.failures {
                assembly.diagnostics.syntax_failure(assembly.sources, failure);
            }
        }
    }
}

/// Whether each section sits inside a molecule scope.
fn molecule_scopes(sections: &[Section]) -> Vec<bool> {
    let mut open = false;
    sections
        .iter()
        .map(|section| {
            match section.kind.category() {
                Category::MoleculeHeader => open = true,
                Category::ForceField | Category::Composition => open = false,
                Category::MoleculeBody | Category::Passthrough => {}
            }
            open
        })
        .collect()
}

/// Build the force field from a resolved include graph.
pub(crate) fn forcefield(
    resolved: &ResolvedSource,
    policy: OverridePolicy,
) -> Result<ForceField, Vec<Diagnostic>> {
    let sections = sections(&resolved.lines);
    let scopes = molecule_scopes(&sections);
    let mut assembly = Assembly::new(&resolved.sources, policy);
    report_failures(&mut assembly, &sections, |s| {
        s.kind.category() == Category::ForceField
    });

    let mut ff = ForceField::default();
    for (section, in_molecule) in sections.iter().zip(scopes) {
        match section.kind.category() {
            Category::ForceField => {
                for entry in &section.entries {
                    add_forcefield_record(&mut assembly, &mut ff, entry.record.clone(), entry.origin);
                }
            }
            Category::Passthrough if section.kind == SectionKind::Opaque && !in_molecule => {
                ff.extra.push(Declared::new(
                    PassthroughBlock::from_section(section),
                    section.origin,
                ));
            }
            _ => {}
        }
    }

    tracing::debug!(entries = ff.len(), overrides = assembly.overrides.len(), "force field assembled");
    ff.overrides = assembly.overrides;
    ff.sources = resolved.sources.clone();
    assembly.diagnostics.finish(ff)
}

fn add_forcefield_record(
    assembly: &mut Assembly<'_>,
    ff: &mut ForceField,
    record: Record,
    origin: Origin,
) {
    match record {
        Record::Defaults(defaults) => {
            assembly.merge_single(&mut ff.defaults, Declared::new(defaults, origin), "defaults")
        }
        Record::AtomType(atom_type) => {
            let key = TypeKey::name(atom_type.name.clone());
            assembly.merge(&mut ff.atom_types, key, Declared::new(atom_type, origin), "atom type");
        }
        Record::NonbondParam(params) => {
            let key = TypeKey::bonded([params.ai.clone(), params.aj.clone()], params.interaction.func);
            assembly.merge(
                &mut ff.nonbond_params,
                key,
                Declared::new(params, origin),
                "nonbonded parameter",
            );
        }
        Record::PairType(params) => {
            let key = TypeKey::bonded([params.ai.clone(), params.aj.clone()], params.interaction.func);
            assembly.merge(&mut ff.pair_types, key, Declared::new(params, origin), "pair type");
        }
        Record::BondType(params) => {
            let key = TypeKey::bonded([params.ai.clone(), params.aj.clone()], params.interaction.func);
            assembly.merge(&mut ff.bond_types, key, Declared::new(params, origin), "bond type");
        }
        Record::AngleType(params) => {
            let key = TypeKey::bonded(
                [params.ai.clone(), params.aj.clone(), params.ak.clone()],
                params.interaction.func,
            );
            assembly.merge(&mut ff.angle_types, key, Declared::new(params, origin), "angle type");
        }
        Record::ConstraintType(params) => {
            let key = TypeKey::bonded([params.ai.clone(), params.aj.clone()], params.interaction.func);
            assembly.merge(
                &mut ff.constraint_types,
                key,
                Declared::new(params, origin),
                "constraint type",
            );
        }
        other => tracing::debug!(record = %other, "not a force-field record"),
    }
}

/// Build the molecule types from a resolved include graph.
///
/// Types whose lines failed are still returned, minus the failed lines,
/// so the composition can be bound against them; the collector holds
/// every failure.
pub(crate) fn molecule_types(
    resolved: &ResolvedSource,
    policy: OverridePolicy,
) -> (MoleculeTypes, DiagnosticCollector) {
    let sections = sections(&resolved.lines);
    let scopes = molecule_scopes(&sections);
    let mut assembly = Assembly::new(&resolved.sources, policy);
    report_failures(&mut assembly, &sections, |s| {
        matches!(
            s.kind.category(),
            Category::MoleculeHeader | Category::MoleculeBody
        )
    });

    let mut types = IndexMap::new();
    // `None` inside a molecule scope means its header did not parse;
    // body sections are then dropped without further reports.
    let mut current: Option<Declared<MoleculeType>> = None;
    for (section, in_molecule) in sections.iter().zip(scopes) {
        match section.kind.category() {
            Category::MoleculeHeader => {
                close(&mut assembly, &mut types, current.take());
                current = open(&mut assembly, section);
            }
            Category::MoleculeBody => match current.as_mut() {
                Some(molecule) => {
                    for record in section.records() {
                        molecule.value.push(record.clone());
                    }
                }
                None if !in_molecule => {
                    let location = assembly.location(section.origin);
                    assembly.diagnostics.add(
                        Diagnostic::error(
                            location,
                            format!("'[ {} ]' section outside any molecule type", section.label),
                        )
                        .with_code(codes::OUTSIDE_MOLECULE_TYPE),
                    );
                }
                None => {}
            },
            Category::Passthrough => {
                if let Some(molecule) = current.as_mut() {
                    if section.kind == SectionKind::Opaque {
                        molecule
                            .value
                            .extra
                            .push(PassthroughBlock::from_section(section));
                    }
                }
            }
            Category::ForceField | Category::Composition => {
                close(&mut assembly, &mut types, current.take());
            }
        }
    }
    close(&mut assembly, &mut types, current.take());

    tracing::debug!(molecule_types = types.len(), "molecule types assembled");
    let molecules = MoleculeTypes {
        types,
        overrides: std::mem::take(&mut assembly.overrides),
        sources: resolved.sources.clone(),
    };
    (molecules, assembly.diagnostics)
}

fn open(assembly: &mut Assembly<'_>, section: &Section) -> Option<Declared<MoleculeType>> {
    let mut headers = section.entries.iter().filter_map(|entry| match &entry.record {
        Record::MoleculeType(header) => Some((header, entry.origin)),
        _ => None,
    });
    let Some((header, origin)) = headers.next() else {
        if section.is_valid() {
            let location = assembly.location(section.origin);
            assembly.diagnostics.add(
                Diagnostic::error(location, "'[ moleculetype ]' section declares no molecule")
                    .with_code(codes::SYNTAX),
            );
        }
        return None;
    };
    for (extra, extra_origin) in headers {
        let location = assembly.location(extra_origin);
        assembly.diagnostics.add(
            Diagnostic::error(
                location,
                format!("second molecule type '{}' in one '[ moleculetype ]' section", extra.name),
            )
            .with_code(codes::SYNTAX),
        );
    }
    Some(Declared::new(MoleculeType::new(header.clone()), origin))
}

fn close(
    assembly: &mut Assembly<'_>,
    types: &mut IndexMap<SmolStr, Declared<MoleculeType>>,
    molecule: Option<Declared<MoleculeType>>,
) {
    let Some(molecule) = molecule else {
        return;
    };
    for (kind, id) in molecule.value.dangling_atom_references() {
        let location = assembly.location(molecule.origin);
        assembly.diagnostics.add(
            Diagnostic::error(
                location,
                format!(
                    "molecule type '{}': '[ {kind} ]' references atom {id}, which '[ atoms ]' does not declare",
                    molecule.value.name
                ),
            )
            .with_code(codes::UNDEFINED_REFERENCE),
        );
    }
    let name = molecule.value.name.clone();
    assembly.merge(types, name, molecule, "molecule type");
}
