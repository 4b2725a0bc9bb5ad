//! Integration tests for input classification

use metadata_inspector::paths::Classifier;
use std::fs;
use tempfile::tempdir;

fn classify(inputs: &[String]) -> metadata_inspector::paths::ClassifiedPaths {
    Classifier::default().classify(inputs)
}

#[test]
fn test_scheme_forces_archive() {
    let classified = classify(&[
        "slk://arch/project/data.nc".to_string(),
        "hsm:///arch/other/data.nc".to_string(),
    ]);
    assert!(classified.filesystem.is_empty());
    assert_eq!(classified.archive.len(), 2);
}

#[test]
fn test_arch_mount_prefix_is_archive_without_existing() {
    let classified = classify(&["/arch/ab1234/exp/data.nc".to_string()]);
    assert!(classified.filesystem.is_empty());
    assert_eq!(classified.archive, vec!["/arch/ab1234/exp/data.nc".to_string()]);
}

#[test]
fn test_custom_archive_prefix() {
    let classifier = Classifier {
        archive_prefixes: vec!["tape".to_string()],
        ..Classifier::default()
    };
    let classified = classifier.classify(&["/tape/x/data.nc".to_string()]);
    assert_eq!(classified.archive.len(), 1);
    // The default prefix no longer applies
    let classified = classifier.classify(&["/arch/x/data.nc".to_string()]);
    assert!(classified.archive.is_empty());
}

#[test]
fn test_directory_expansion_is_case_insensitive_and_sorted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.nc"), b"").unwrap();
    fs::write(dir.path().join("b.txt"), b"").unwrap();
    fs::write(dir.path().join("c.GRIB2"), b"").unwrap();

    let classified = classify(&[dir.path().to_string_lossy().to_string()]);
    let names: Vec<String> = classified
        .filesystem
        .iter()
        .map(|p| p.rsplit('/').next().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.nc", "c.GRIB2"]);
    assert!(classified.archive.is_empty());
}

#[test]
fn test_existing_file_is_taken_as_is() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("data.nc");
    fs::write(&file, b"").unwrap();

    let classified = classify(&[file.to_string_lossy().to_string()]);
    assert_eq!(classified.filesystem, vec![file.to_string_lossy().to_string()]);
}

#[test]
fn test_zarr_store_is_a_single_entry() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("data.zarr");
    fs::create_dir(&store).unwrap();
    fs::write(store.join(".zgroup"), b"{\"zarr_format\": 2}").unwrap();

    let classified = classify(&[store.to_string_lossy().to_string()]);
    assert_eq!(classified.filesystem, vec![store.to_string_lossy().to_string()]);
}

#[test]
fn test_parent_glob_expansion_is_case_sensitive() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("tas_2000.nc"), b"").unwrap();
    fs::write(dir.path().join("tas_2001.NC"), b"").unwrap();
    fs::write(dir.path().join("pr_2000.nc"), b"").unwrap();

    let pattern = dir.path().join("tas_*.nc");
    let classified = classify(&[pattern.to_string_lossy().to_string()]);
    let names: Vec<String> = classified
        .filesystem
        .iter()
        .map(|p| p.rsplit('/').next().unwrap().to_string())
        .collect();
    // tas_2001.NC is excluded: the parent glob keeps the extension match
    // case-sensitive, unlike the directory scan
    assert_eq!(names, vec!["tas_2000.nc"]);
}

#[test]
fn test_parent_glob_can_be_made_case_insensitive() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("tas_2000.nc"), b"").unwrap();
    fs::write(dir.path().join("tas_2001.NC"), b"").unwrap();

    let classifier = Classifier {
        pattern_scan_ignore_case: true,
        ..Classifier::default()
    };
    let pattern = dir.path().join("tas_*");
    let classified = classifier.classify(&[pattern.to_string_lossy().to_string()]);
    assert_eq!(classified.filesystem.len(), 2);
}

#[test]
fn test_unresolvable_specifier_passes_through() {
    let classified = classify(&["/no/such/parent/anywhere/data.nc".to_string()]);
    assert_eq!(
        classified.filesystem,
        vec!["/no/such/parent/anywhere/data.nc".to_string()]
    );
}

#[test]
fn test_duplicate_inputs_are_deduplicated() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("data.nc");
    fs::write(&file, b"").unwrap();
    let spec = file.to_string_lossy().to_string();

    let classified = classify(&[spec.clone(), spec.clone()]);
    assert_eq!(classified.filesystem.len(), 1);
}

#[test]
fn test_bare_relative_filename_does_not_panic() {
    // Fewer than two path parts before absolutization; must not crash on
    // the archive mount check
    let classified = classify(&["no_such_input_7f3a9c.nc".to_string()]);
    assert!(classified.archive.is_empty());
}
