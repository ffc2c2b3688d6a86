use std::fs;

use storage_testing::lab::LabSession;
use storage_testing::spec;

fn bundled_spec_names() -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(spec::specs_root())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                return None;
            }
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}

#[test]
fn bundled_specs_load_and_build_trees() {
    let names = bundled_spec_names();
    assert!(names.len() >= 5, "found only {names:?}");

    for name in names {
        let loaded = spec::load_by_name(&name).unwrap();
        assert_eq!(loaded.name, name, "spec name must match its file name");

        let session = LabSession::open(loaded);
        let tree = session.render_tree();
        assert!(!tree.is_empty(), "{name} produced an empty tree");
    }
}

#[test]
fn mbr_two_primaries_tree_shows_both_gaps() {
    let session = LabSession::load("mbr-two-primaries", None).unwrap();
    let tree = session.render_tree();

    let top: Vec<&str> = tree.lines().filter(|line| !line.starts_with(' ')).collect();
    assert_eq!(top.len(), 1);
    assert!(top[0].contains("[drive]"));
    assert!(top[0].ends_with("(drive_/dev/sda_enclosed_by_(none))"));

    let holes: Vec<&str> = tree.lines().filter(|line| line.contains("[volume-hole]")).collect();
    assert_eq!(holes.len(), 2);
    assert!(holes.iter().all(|line| line.trim_start().starts_with("100.00 GB Free")));
    assert_eq!(tree.lines().filter(|line| line.contains("[volume]")).count(), 2);
}

#[test]
fn unlocked_luks_volume_nests_under_its_partition() {
    let session = LabSession::load("luks-gpt", None).unwrap();
    let tree = session.render_tree();

    let cleartext = tree
        .lines()
        .find(|line| line.contains("(volume_/dev/dm-0_enclosed_by_volume_/dev/nvme0n1p2"))
        .unwrap();
    let indent = cleartext.len() - cleartext.trim_start().len();
    assert_eq!(indent, 4);

    let capacity = session.render_capacity();
    assert!(capacity.contains("create volume: no"));
    assert!(!capacity.contains("mbr:"));
}

#[test]
fn capacity_reports_extended_partitions_and_arrays() {
    let session = LabSession::load("mbr-extended", None).unwrap();
    let capacity = session.render_capacity();
    assert!(capacity.contains("mbr: 2 primary, extended"));
    assert!(capacity.contains("  volumes: 3\n"));
    assert!(capacity.contains("create volume: yes"));

    let session = LabSession::load("raid1-degraded", None).unwrap();
    let capacity = session.render_capacity();
    assert!(capacity.contains("array: stopped, can start degraded"));
}
