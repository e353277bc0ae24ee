//! End-to-end tests for the topology composite: shallow parse, pulls,
//! include resolution and the duplicate-definition policy.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use moltopol::diagnostics::codes;
use moltopol::project::{FileSystem, MemoryFileSystem, ResolutionError};
use moltopol::schema::{MoleculeCount, ParticleType};
use moltopol::topology::TypeKey;
use moltopol::{Error, OsFileSystem, OverridePolicy, ParseConfig, State, Topology};
use rstest::rstest;
use tempfile::TempDir;

fn data(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data/gmx")
        .join(path)
}

fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn in_memory(files: &[(&str, &str)]) -> Arc<MemoryFileSystem> {
    let mut fs = MemoryFileSystem::new();
    for (path, contents) in files {
        fs.insert(path, *contents);
    }
    Arc::new(fs)
}

// ============================================================================
// SHALLOW PARSE
// ============================================================================

#[test]
fn test_shallow_parse_martini_system() {
    let topology = Topology::parse(data("martini/system.top")).unwrap();

    assert_eq!(topology.system(), "Martini system");
    assert_eq!(
        topology.molecules().cloned().collect::<Vec<_>>(),
        vec![MoleculeCount::new("DOPC", 2), MoleculeCount::new("DPPC", 1)]
    );
    assert_eq!(topology.state(), State::ShallowParsed);
    assert!(topology.forcefield().is_none());
    assert!(topology.molecule_types().is_none());

    let includes: Vec<&str> = topology
        .includes()
        .iter()
        .map(|edge| edge.reference.as_str())
        .collect();
    assert_eq!(includes, vec!["toppar/martini_v3.itp", "toppar/lipids.itp"]);
    assert!(topology.includes().iter().all(|edge| edge.target.is_none()));
}

#[test]
fn test_shallow_parse_ignores_broken_includes() {
    let dir = write_tree(&[(
        "system.top",
        "#include \"nowhere.itp\"\n[ system ]\nLonely\n[ molecules ]\nW 1\n",
    )]);
    let topology = Topology::parse(dir.path().join("system.top")).unwrap();
    assert_eq!(topology.system(), "Lonely");
}

#[test]
fn test_multiline_system_name_is_joined() {
    let fs = in_memory(&[(
        "system.top",
        "[ system ]\nLipid bilayer\n; comment\nin water\n[ molecules ]\n",
    )]);
    let topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    assert_eq!(topology.system(), "Lipid bilayer in water");
}

#[test]
fn test_repeated_composition_names_are_kept() {
    let fs = in_memory(&[(
        "system.top",
        "[ system ]\nX\n[ molecules ]\nW 10\nNA 1\nW 5\n",
    )]);
    let topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let names: Vec<&str> = topology.molecules().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["W", "NA", "W"]);
}

#[rstest]
#[case::no_system("[ molecules ]\nW 1\n", "system")]
#[case::empty_system("[ system ]\n; nothing\n[ molecules ]\nW 1\n", "system")]
#[case::no_molecules("[ system ]\nX\n", "molecules")]
fn test_missing_mandatory_fields(#[case] text: &str, #[case] expected: &str) {
    let fs = in_memory(&[("system.top", text)]);
    let err = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap_err();
    match err {
        Error::MissingMandatory { field, path } => {
            assert!(field.contains(expected), "field was {field}");
            assert_eq!(path, Path::new("system.top"));
        }
        other => panic!("expected a missing-field error, got {other}"),
    }
}

#[test]
fn test_missing_entry_file_is_io_failure() {
    let dir = TempDir::new().unwrap();
    let err = Topology::parse(dir.path().join("absent.top")).unwrap_err();
    assert!(matches!(err, Error::Resolution(ResolutionError::Io { .. })));
}

// ============================================================================
// PULLS
// ============================================================================

#[test]
fn test_pull_forcefield_martini() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    let forcefield = topology.pull_forcefield().unwrap();

    let defaults = &forcefield.defaults.as_ref().unwrap().value;
    assert_eq!((defaults.nbfunc, defaults.comb_rule), (1, 2));

    let names: Vec<&str> = forcefield
        .atom_types
        .keys()
        .map(|key| key.types[0].as_str())
        .collect();
    assert_eq!(names, vec!["P5", "Q1", "Na", "C1", "TC4"]);

    let p5 = forcefield.atom_type("P5").unwrap();
    assert_eq!(p5.mass, 72.0);
    assert_eq!(p5.particle_type, ParticleType::Atom);

    assert!(forcefield.nonbond_param("Q1", "P5", 1).is_some());
    assert!(forcefield.nonbond_param("P5", "Q1", 1).is_some());
    assert!(forcefield.nonbond_param("P5", "Q1", 2).is_none());
    assert!(forcefield.overrides.is_empty());

    assert_eq!(
        topology.state(),
        State::PartiallyMaterialized {
            forcefield: true,
            molecule_types: false
        }
    );
}

#[test]
fn test_pull_molecule_types_martini() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    let molecule_types = topology.pull_molecule_types().unwrap();

    assert_eq!(molecule_types.names().collect::<Vec<_>>(), vec!["DOPC", "DPPC"]);
    let dopc = molecule_types.get("DOPC").unwrap();
    assert_eq!(dopc.nrexcl, 1);
    assert_eq!(dopc.atoms.len(), 6);
    assert_eq!(dopc.bonds.len(), 5);
    assert_eq!(dopc.angles.len(), 2);
    assert!(dopc.position_restraints.is_empty());
    assert!(dopc.total_charge().abs() < 1e-12);

    let bound: Vec<(&str, u32)> = topology
        .bound_molecules()
        .unwrap()
        .into_iter()
        .map(|(molecule, count)| (molecule.name.as_str(), count))
        .collect();
    assert_eq!(bound, vec![("DOPC", 2), ("DPPC", 1)]);
    assert_eq!(topology.atom_count(), Some(6 * 2 + 4));
}

#[test]
fn test_define_activates_conditional_sections() {
    let config = ParseConfig::default().define("POSRES");
    let mut topology =
        Topology::parse_with(Arc::new(OsFileSystem), data("martini/system.top"), config).unwrap();
    let molecule_types = topology.pull_molecule_types().unwrap();
    assert_eq!(molecule_types.get("DOPC").unwrap().position_restraints.len(), 1);
    assert!(molecule_types.get("DPPC").unwrap().position_restraints.is_empty());
}

#[test]
fn test_pull_is_idempotent() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    let first = topology.pull_molecule_types().unwrap().clone();
    let second = topology.pull_molecule_types().unwrap().clone();
    assert_eq!(first, second);
}

#[test]
fn test_pull_order_does_not_matter() {
    let mut forward = Topology::parse(data("martini/system.top")).unwrap();
    forward.pull_forcefield().unwrap();
    forward.pull_molecule_types().unwrap();

    let mut backward = Topology::parse(data("martini/system.top")).unwrap();
    backward.pull_molecule_types().unwrap();
    backward.pull_forcefield().unwrap();

    assert_eq!(forward.forcefield(), backward.forcefield());
    assert_eq!(forward.molecule_types(), backward.molecule_types());
}

#[test]
fn test_shared_include_is_deduplicated() {
    let mut topology = Topology::parse(data("shared_ff/system.top")).unwrap();
    let forcefield = topology.pull_forcefield().unwrap();
    assert_eq!(forcefield.atom_types.len(), 2);
    assert!(forcefield.overrides.is_empty());

    topology.pull_molecule_types().unwrap();
    assert_eq!(topology.atom_count(), Some(10 + 1));
}

#[test]
fn test_failed_pull_leaves_state_untouched() {
    let dir = write_tree(&[
        ("system.top", "#include \"ff.itp\"\n[ system ]\nX\n[ molecules ]\nW 1\n"),
        ("ff.itp", "[ atomtypes ]\nP4 72.0 0.0 A 0.0 0.0\n"),
    ]);
    let mut topology = Topology::parse(dir.path().join("system.top")).unwrap();
    topology.pull_forcefield().unwrap();

    fs::write(dir.path().join("ff.itp"), "[ atomtypes ]\nP4 heavy 0.0 A 0.0 0.0\n").unwrap();
    let err = topology.pull_forcefield().unwrap_err();
    assert_eq!(err.diagnostics()[0].code, Some(codes::SYNTAX));

    let kept = topology.forcefield().unwrap();
    assert_eq!(kept.atom_type("P4").unwrap().mass, 72.0);
}

#[test]
fn test_unbound_composition_name_is_reported_at_pull() {
    let fs = in_memory(&[
        ("system.top", "#include \"w.itp\"\n[ system ]\nX\n[ molecules ]\nW 1\nPOPC 4\n"),
        ("w.itp", "[ moleculetype ]\nW 1\n[ atoms ]\n1 P4 1 W W 1 0\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();

    let err = topology.pull_molecule_types().unwrap_err();
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, Some(codes::UNDEFINED_REFERENCE));
    assert_eq!(diagnostics[0].location.path, Path::new("system.top"));
    assert_eq!(diagnostics[0].location.line, 6);
    assert_eq!(topology.state(), State::ShallowParsed);
}

#[test]
fn test_syntax_and_reference_failures_reported_together() {
    let fs = in_memory(&[
        ("system.top", "#include \"w.itp\"\n[ system ]\nX\n[ molecules ]\nW 1\nPOPC 4\n"),
        ("w.itp", "[ moleculetype ]\nW 1\n[ atoms ]\n1 P4 1 W W 1 0 zero\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();

    let err = topology.pull_molecule_types().unwrap_err();
    let reported: Vec<_> = err
        .diagnostics()
        .iter()
        .map(|d| (d.code, d.location.to_string()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (Some(codes::SYNTAX), "w.itp:4".to_string()),
            (Some(codes::UNDEFINED_REFERENCE), "system.top:6".to_string()),
        ]
    );
    assert_eq!(topology.state(), State::ShallowParsed);
}

#[test]
fn test_release_returns_to_shallow_state() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    topology.pull_forcefield().unwrap();
    topology.pull_molecule_types().unwrap();
    topology.release();
    assert_eq!(topology.state(), State::ShallowParsed);
    assert!(topology.bound_molecules().is_none());
}

// ============================================================================
// INCLUDE RESOLUTION
// ============================================================================

#[test]
fn test_missing_include_names_path_and_includer() {
    let dir = write_tree(&[(
        "system.top",
        "#include \"toppar/missing.itp\"\n[ system ]\nX\n[ molecules ]\n",
    )]);
    let mut topology = Topology::parse(dir.path().join("system.top")).unwrap();
    let err = topology.pull_forcefield().unwrap_err();

    let message = err.to_string();
    assert!(message.contains("toppar/missing.itp"), "{message}");
    assert!(message.contains("system.top:1"), "{message}");
    assert!(matches!(
        err,
        Error::Resolution(ResolutionError::MissingInclude { .. })
    ));
}

/// Finds every file but fails to read `denied`.
struct DenyRead {
    files: MemoryFileSystem,
    denied: &'static str,
}

impl FileSystem for DenyRead {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        if path == Path::new(self.denied) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        self.files.read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.is_file(path)
    }
}

#[test]
fn test_unreadable_include_names_path_and_includer() {
    let fs = DenyRead {
        files: MemoryFileSystem::new()
            .with_file("system.top", "#include \"ff.itp\"\n[ system ]\nX\n[ molecules ]\n")
            .with_file("ff.itp", "[ atomtypes ]\n"),
        denied: "ff.itp",
    };
    let mut topology = Topology::parse_with(Arc::new(fs), "system.top", ParseConfig::default()).unwrap();
    let err = topology.pull_forcefield().unwrap_err();

    let message = err.to_string();
    assert!(message.contains("ff.itp"), "{message}");
    assert!(message.contains("referenced from system.top:1"), "{message}");
    match err {
        Error::Resolution(ResolutionError::UnreadableInclude { path, from, line, .. }) => {
            assert_eq!(path, Path::new("ff.itp"));
            assert_eq!(from, Path::new("system.top"));
            assert_eq!(line, 1);
        }
        other => panic!("expected an unreadable include, got {other}"),
    }
}

#[test]
fn test_latin1_comment_in_include_does_not_fail_the_pull() {
    let dir = write_tree(&[("system.top", "#include \"ff.itp\"\n[ system ]\nX\n[ molecules ]\n")]);
    fs::write(
        dir.path().join("ff.itp"),
        b"; parametrised by J. M\xf6ller\n[ atomtypes ]\nP4 72.0 0.0 A 0.0 0.0\n",
    )
    .unwrap();
    let mut topology = Topology::parse(dir.path().join("system.top")).unwrap();
    let forcefield = topology.pull_forcefield().unwrap();
    assert_eq!(forcefield.atom_type("P4").unwrap().mass, 72.0);
}

#[test]
fn test_circular_include_is_reported() {
    let fs = in_memory(&[
        ("system.top", "#include \"a.itp\"\n[ system ]\nX\n[ molecules ]\n"),
        ("a.itp", "#include \"b.itp\"\n"),
        ("b.itp", "#include \"a.itp\"\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let err = topology.pull_forcefield().unwrap_err();
    assert!(err.to_string().contains("a.itp -> b.itp -> a.itp"), "{err}");
    match err {
        Error::Resolution(ResolutionError::Cycle { chain, .. }) => {
            assert_eq!(chain.first(), chain.last());
            assert_eq!(chain.len(), 3);
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn test_system_include_searches_include_dirs() {
    let library = write_tree(&[("top/martini.ff/forcefield.itp", "[ atomtypes ]\nP5 72.0 0.0 A 0.0 0.0\n")]);
    let project = write_tree(&[(
        "system.top",
        "#include <martini.ff/forcefield.itp>\n[ system ]\nX\n[ molecules ]\n",
    )]);
    let entry = project.path().join("system.top");

    let mut without = Topology::parse(&entry).unwrap();
    assert!(without.pull_forcefield().is_err());

    let config = ParseConfig::default().include_dir(library.path().join("top"));
    let mut with = Topology::parse_with(Arc::new(OsFileSystem), &entry, config).unwrap();
    assert!(with.pull_forcefield().unwrap().atom_type("P5").is_some());
}

#[test]
fn test_deferred_reference_resolves_after_definition() {
    // The bond type refers to atom types declared by a later include.
    let fs = in_memory(&[
        (
            "system.top",
            "#include \"bonded.itp\"\n#include \"nonbonded.itp\"\n[ system ]\nX\n[ molecules ]\n",
        ),
        ("bonded.itp", "[ bondtypes ]\nP5 Qa 1 0.47 1250\n"),
        ("nonbonded.itp", "[ atomtypes ]\nP5 72.0 0.0 A 0.0 0.0\nQa 72.0 0.0 A 0.0 0.0\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let forcefield = topology.pull_forcefield().unwrap();
    assert!(forcefield.bond_type("Qa", "P5", 1).is_some());
    assert_eq!(forcefield.atom_types.len(), 2);
}

// ============================================================================
// DUPLICATE DEFINITIONS
// ============================================================================

const ENTRY_WITH_OVERRIDE: &str = "\
#include \"ff.itp\"

[ atomtypes ]
P5 45.0 0.000 A 0.0 0.0

[ system ]
X

[ molecules ]
";

fn overriding_tree() -> Arc<MemoryFileSystem> {
    in_memory(&[
        ("system.top", ENTRY_WITH_OVERRIDE),
        ("ff.itp", "[ atomtypes ]\nP5 72.0 0.000 A 0.0 0.0\n"),
    ])
}

#[test]
fn test_identical_definitions_in_two_includes() {
    let fs = in_memory(&[
        ("system.top", "#include \"a.itp\"\n#include \"b.itp\"\n[ system ]\nX\n[ molecules ]\n"),
        ("a.itp", "[ atomtypes ]\nP5 72.0 0.000 A 0.0 0.0\n"),
        ("b.itp", "[ atomtypes ]\nP5   72.0   0.000   A   0.0   0.0   ; same\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let forcefield = topology.pull_forcefield().unwrap();
    assert_eq!(forcefield.atom_types.len(), 1);
    assert_eq!(forcefield.atom_types[&TypeKey::name("P5")].origin.line, 2);
}

#[test]
fn test_conflicting_definitions_in_two_includes() {
    let fs = in_memory(&[
        ("system.top", "#include \"a.itp\"\n#include \"b.itp\"\n[ system ]\nX\n[ molecules ]\n"),
        ("a.itp", "[ atomtypes ]\nP5 72.0 0.000 A 0.0 0.0\n"),
        ("b.itp", "[ atomtypes ]\nP5 36.0 0.000 A 0.0 0.0\n"),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let err = topology.pull_forcefield().unwrap_err();

    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code, Some(codes::AMBIGUOUS_DEFINITION));
    assert_eq!(diagnostic.location.path, Path::new("b.itp"));
    assert!(diagnostic.message.contains("P5"));
    assert_eq!(diagnostic.related[0].location.path, Path::new("a.itp"));
}

#[rstest]
#[case::strict(OverridePolicy::Strict, None)]
#[case::entry_file_wins(OverridePolicy::EntryFileWins, Some(45.0))]
#[case::last_wins(OverridePolicy::LastWins, Some(45.0))]
fn test_override_policy(#[case] policy: OverridePolicy, #[case] mass: Option<f64>) {
    let config = ParseConfig::default().override_policy(policy);
    let mut topology = Topology::parse_with(overriding_tree(), "system.top", config).unwrap();
    let pulled = topology.pull_forcefield();
    match mass {
        Some(mass) => {
            let forcefield = pulled.unwrap();
            assert_eq!(forcefield.atom_type("P5").unwrap().mass, mass);
            assert_eq!(forcefield.overrides.len(), 1);
            let replaced = &forcefield.overrides[0];
            assert_eq!(replaced.previous.path, Path::new("ff.itp"));
            assert_eq!(replaced.replacement.path, Path::new("system.top"));
            assert_eq!(replaced.replacement.line, 4);
            let warnings = forcefield.warnings();
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].code, Some(codes::OVERRIDDEN_DEFINITION));
            assert_eq!(warnings[0].location, replaced.replacement);
            assert_eq!(warnings[0].related[0].location, replaced.previous);
        }
        None => {
            let err = pulled.unwrap_err();
            assert_eq!(err.diagnostics()[0].code, Some(codes::AMBIGUOUS_DEFINITION));
        }
    }
}

#[test]
fn test_duplicate_molecule_type_with_same_body_is_deduplicated() {
    let water = "[ moleculetype ]\nW 1\n[ atoms ]\n1 P4 1 W W 1 0\n";
    let fs = in_memory(&[
        ("system.top", "#include \"a.itp\"\n#include \"b.itp\"\n[ system ]\nX\n[ molecules ]\nW 3\n"),
        ("a.itp", water),
        ("b.itp", water),
    ]);
    let mut topology = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    assert_eq!(topology.pull_molecule_types().unwrap().len(), 1);
    assert_eq!(topology.atom_count(), Some(3));
}

// ============================================================================
// WRITING BACK
// ============================================================================

#[test]
fn test_forcefield_text_reparses_to_same_tables() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    let written = topology.pull_forcefield().unwrap().to_string();

    let fs = in_memory(&[
        ("system.top", "#include \"ff.itp\"\n[ system ]\nX\n[ molecules ]\n"),
        ("ff.itp", written.as_str()),
    ]);
    let mut reread = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let reread = reread.pull_forcefield().unwrap();
    let original = topology.forcefield().unwrap();

    assert_eq!(
        reread.atom_types.values().map(|d| &d.value).collect::<Vec<_>>(),
        original.atom_types.values().map(|d| &d.value).collect::<Vec<_>>()
    );
    assert_eq!(
        reread.nonbond_params.values().map(|d| &d.value).collect::<Vec<_>>(),
        original.nonbond_params.values().map(|d| &d.value).collect::<Vec<_>>()
    );
}

#[test]
fn test_molecule_types_text_reparses_to_same_molecules() {
    let mut topology = Topology::parse(data("martini/system.top")).unwrap();
    let written = topology.pull_molecule_types().unwrap().to_string();

    let fs = in_memory(&[
        ("system.top", "#include \"mol.itp\"\n[ system ]\nX\n[ molecules ]\nDOPC 2\nDPPC 1\n"),
        ("mol.itp", written.as_str()),
    ]);
    let mut reread = Topology::parse_with(fs, "system.top", ParseConfig::default()).unwrap();
    let reread: Vec<_> = reread.pull_molecule_types().unwrap().iter().cloned().collect();
    let original: Vec<_> = topology.molecule_types().unwrap().iter().cloned().collect();
    assert_eq!(reread, original);
}

// ============================================================================
// BATCH LOADING
// ============================================================================

#[test]
fn test_loader_reads_fixture_systems_in_parallel() {
    use moltopol::{Pulls, TopologyLoader};

    let paths = vec![
        data("martini/system.top"),
        data("shared_ff/system.top"),
        data("missing/system.top"),
    ];
    let results = TopologyLoader::new().with_pulls(Pulls::ALL).load(&paths);

    let systems: Vec<Option<&str>> = results
        .iter()
        .map(|(_, result)| result.as_ref().ok().map(Topology::system))
        .collect();
    assert_eq!(systems, vec![Some("Martini system"), Some("Solvent box"), None]);

    let counts: Vec<Option<usize>> = results
        .iter()
        .map(|(_, result)| result.as_ref().ok().and_then(Topology::atom_count))
        .collect();
    assert_eq!(counts, vec![Some(16), Some(11), None]);
}
