//! Batch loading with library directories taken from `GMXLIB`.
//!
//! Kept in its own test binary: it sets a process-wide variable.

use std::fs;
use std::path::PathBuf;

use moltopol::config::GMXLIB;
use moltopol::{Pulls, Topology, TopologyLoader};

#[test]
fn test_loader_resolves_system_includes_from_gmxlib() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("gmxlib");
    fs::create_dir_all(library.join("martini.ff")).unwrap();
    fs::write(
        library.join("martini.ff/forcefield.itp"),
        "[ atomtypes ]\nP4 72.0 0.0 A 0.0 0.0\n[ moleculetype ]\nW 1\n[ atoms ]\n1 P4 1 W W 1 0\n",
    )
    .unwrap();

    let mut paths: Vec<PathBuf> = Vec::new();
    for idx in 1..=3 {
        let run = dir.path().join(format!("run{idx}"));
        fs::create_dir_all(&run).unwrap();
        let top = run.join("topol.top");
        fs::write(
            &top,
            format!("#include <martini.ff/forcefield.itp>\n[ system ]\nrun {idx}\n[ molecules ]\nW {idx}\n"),
        )
        .unwrap();
        paths.push(top);
    }

    // SAFETY: the only test in this binary, so no other thread reads the
    // environment concurrently.
    unsafe { std::env::set_var(GMXLIB, &library) };

    let results = TopologyLoader::new().with_pulls(Pulls::ALL).load(&paths);
    for (idx, (_, result)) in results.iter().enumerate() {
        let topology = result.as_ref().unwrap();
        assert_eq!(topology.atom_count(), Some(idx + 1));
    }

    // The single-file entry point resolves the same way.
    let mut single = Topology::parse(&paths[0]).unwrap();
    assert_eq!(single.pull_molecule_types().unwrap().len(), 1);
}
