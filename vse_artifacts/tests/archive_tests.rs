// Integration tests for artifact archive export/import.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

use vse_artifacts::{export_archive, import_archive, naming, save_preprocessor};

/// Relative path -> contents (None for directories).
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
            let contents = if e.file_type().is_dir() {
                None
            } else {
                Some(fs::read(e.path()).unwrap())
            };
            (rel, contents)
        })
        .collect()
}

fn populate(dir: &Path) {
    let race = naming::race_token("Shanghai", 2019);
    fs::create_dir_all(dir.join("policies").join("checkpoint")).unwrap();
    fs::create_dir_all(dir.join("empty")).unwrap();
    fs::write(dir.join(naming::policy_tflite_file(&race)), [0u8, 1, 2, 255, 254, 7]).unwrap();
    fs::write(dir.join("policies").join("checkpoint").join("ckpt-1.index"), b"index").unwrap();
    fs::write(dir.join("policies").join("README"), b"").unwrap();
    save_preprocessor(&vec!["A3", "A4", "A6"], dir, &race).unwrap();
}

#[test]
fn test_archive_round_trip_is_byte_exact() {
    println!("\n=== Test: Archive Round Trip ===");
    let temp = tempdir().expect("Failed to create temp dir");
    let src = temp.path().join("vse");
    populate(&src);

    let bundle = export_archive(&src, &temp.path().join("vse_export")).expect("export failed");
    assert_eq!(bundle, temp.path().join("vse_export.zip"));
    assert!(bundle.is_file());

    let dst = temp.path().join("restored");
    let files = import_archive(&bundle, &dst).expect("import failed");
    assert_eq!(files, 4);

    assert_eq!(snapshot(&src), snapshot(&dst));
    println!("✓ {} entries restored byte for byte", snapshot(&dst).len());
}

#[test]
fn test_export_creates_missing_parent_directories() {
    println!("\n=== Test: Export Into New Directory ===");
    let temp = tempdir().expect("Failed to create temp dir");
    let src = temp.path().join("vse");
    populate(&src);

    let base = temp.path().join("backup").join("2019").join("vse");
    let bundle = export_archive(&src, &base).expect("export failed");
    assert_eq!(bundle, temp.path().join("backup").join("2019").join("vse.zip"));
    assert!(bundle.is_file());

    let dst = temp.path().join("restored");
    import_archive(&bundle, &dst).expect("import failed");
    assert_eq!(snapshot(&src), snapshot(&dst));
    println!("✓ Archive written to {}", bundle.display());
}

#[test]
fn test_import_replaces_existing_directory() {
    let temp = tempdir().expect("Failed to create temp dir");
    let src = temp.path().join("vse");
    populate(&src);
    let bundle = export_archive(&src, &temp.path().join("bundle")).expect("export failed");

    let dst = temp.path().join("target");
    fs::create_dir_all(&dst).unwrap();
    fs::write(dst.join("stale.tflite"), b"old model").unwrap();

    import_archive(&bundle, &dst).expect("import failed");
    assert!(!dst.join("stale.tflite").exists(), "stale files must be removed");
    assert_eq!(snapshot(&src), snapshot(&dst));
}

#[test]
fn test_archive_inside_source_directory_is_skipped() {
    let temp = tempdir().expect("Failed to create temp dir");
    let src = temp.path().join("vse");
    populate(&src);

    let bundle = export_archive(&src, &src.join("self")).expect("export failed");
    let dst = temp.path().join("restored");
    import_archive(&bundle, &dst).expect("import failed");
    assert!(!dst.join("self.zip").exists());
}
