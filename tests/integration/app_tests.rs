use clap::Parser;
use linesweep::cli::{normalize_legacy_args, Cli};
use linesweep::error::{ExitCode, UsageError};
use linesweep::run_app;
use std::fs;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(normalize_legacy_args(args.iter().copied())).unwrap()
}

#[test]
fn test_run_app_one_shot() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "b\n# note\na\n").unwrap();
    fs::write(dir.path().join("b.txt"), "b\n# note\na\n").unwrap();
    let root = dir.path().to_str().unwrap();

    let code = run_app(cli(&["linesweep", "-q", "-path", root])).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!dir.path().join("b.txt").exists());
    assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a\nb\n");
}

#[test]
fn test_run_app_missing_path() {
    let err = run_app(cli(&["linesweep", "-q"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UsageError>(),
        Some(UsageError::MissingPath)
    ));
}

#[test]
fn test_run_app_nonexistent_directory() {
    let err = run_app(cli(&["linesweep", "-q", "/no/such/linesweep/target"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UsageError>(),
        Some(UsageError::NotFound(_))
    ));
}

#[test]
fn test_run_app_file_target() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "b\na\n").unwrap();

    let err = run_app(cli(&["linesweep", "-q", file.to_str().unwrap()])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UsageError>(),
        Some(UsageError::NotADirectory(_))
    ));
    // Nothing was touched.
    assert_eq!(fs::read_to_string(&file).unwrap(), "b\na\n");
}

#[test]
fn test_run_app_with_config_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("list.txt"), "z\ny\n").unwrap();

    let config = dir.path().join("config.toml");
    fs::write(&config, "debounce_ms = 10\n").unwrap();

    let code = run_app(cli(&[
        "linesweep",
        "-q",
        data.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_to_string(data.join("list.txt")).unwrap(), "y\nz\n");
}
