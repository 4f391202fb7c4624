use linesweep::config::Config;
use linesweep::duplicates::DuplicateEliminator;
use linesweep::normalize::{BatchConfig, BatchProcessor};
use linesweep::scanner::WalkerConfig;
use linesweep::signal::create_handler;
use linesweep::{sweep, SweepError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_duplicate_then_normalize_scenario() {
    let dir = tempdir().unwrap();
    let content = "line2\nline1\nline1\n#comment\n\n";
    fs::write(dir.path().join("a.txt"), content).unwrap();
    fs::write(dir.path().join("b.txt"), content).unwrap();

    let report = sweep(dir.path(), &Config::default(), &create_handler(), None).unwrap();

    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "line1\nline2\n"
    );
    assert_eq!(report.elimination.duplicates_removed(), 1);
    assert_eq!(report.elimination.reclaimed_bytes(), content.len() as u64);
    assert_eq!(report.normalization.files_processed, 1);
    assert_eq!(report.normalization.files_rewritten, 1);
}

#[test]
fn test_distinct_files_all_kept() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.txt"), "b\na\n").unwrap();
    fs::write(dir.path().join("two.txt"), "a\nb\n").unwrap();

    let report = sweep(dir.path(), &Config::default(), &create_handler(), None).unwrap();

    // Different bytes before normalization, so neither is a duplicate.
    assert_eq!(report.elimination.duplicates_removed(), 0);
    assert_eq!(fs::read_to_string(dir.path().join("one.txt")).unwrap(), "a\nb\n");
    assert_eq!(fs::read_to_string(dir.path().join("two.txt")).unwrap(), "a\nb\n");
}

#[test]
fn test_nested_duplicate_keeps_first_in_name_order() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a_dir")).unwrap();
    fs::create_dir_all(dir.path().join("z_dir")).unwrap();
    fs::write(dir.path().join("z_dir").join("copy.txt"), "x\n").unwrap();
    fs::write(dir.path().join("a_dir").join("copy.txt"), "x\n").unwrap();
    fs::write(dir.path().join("m.txt"), "x\n").unwrap();

    let summary = DuplicateEliminator::with_defaults()
        .eliminate(dir.path())
        .unwrap();

    assert!(dir.path().join("a_dir").join("copy.txt").exists());
    assert!(!dir.path().join("m.txt").exists());
    assert!(!dir.path().join("z_dir").join("copy.txt").exists());
    assert_eq!(summary.unique_files, 1);
    assert!(summary
        .removed
        .iter()
        .all(|r| r.original == dir.path().join("a_dir").join("copy.txt")));
}

#[test]
fn test_empty_files_are_duplicates_of_each_other() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();

    let summary = DuplicateEliminator::with_defaults()
        .eliminate(dir.path())
        .unwrap();

    assert_eq!(summary.duplicates_removed(), 1);
    assert!(dir.path().join("a.txt").exists());
}

#[test]
fn test_normalization_leaves_clean_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.txt");
    fs::write(&path, "alpha\nbeta\n").unwrap();
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let summary = BatchProcessor::default().process_tree(dir.path()).unwrap();

    assert_eq!(summary.files_rewritten, 0);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn test_interrupted_sweep() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("b.txt"), "same").unwrap();

    let handler = create_handler();
    handler.request_shutdown();

    let result = sweep(dir.path(), &Config::default(), &handler, None);
    assert!(matches!(result, Err(SweepError::Interrupted)));
    assert!(dir.path().join("b.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_normalizes_its_target() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let real = outside.path().join("real.txt");
    let link = dir.path().join("link.txt");

    for follow in [false, true] {
        fs::write(&real, "b\na\n").unwrap();
        let _ = fs::remove_file(&link);
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let config = BatchConfig::default().with_walker_config(WalkerConfig::new(follow));
        let summary = BatchProcessor::new(config).process_tree(dir.path()).unwrap();

        assert_eq!(summary.files_rewritten, 1, "follow_symlinks = {follow}");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "a\nb\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "a\nb\n");
    }
}
