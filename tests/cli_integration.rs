//! Integration tests for the posemark binary.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated configuration directory.
fn posemark(config_home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("posemark");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG")
        .env_remove("POSEMARK_CONF")
        .env_remove("POSEMARK_DEVICE");
    cmd
}

#[test]
fn test_help_lists_required_paths() {
    let home = TempDir::new().unwrap();
    posemark(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--out"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_missing_arguments_fail() {
    let home = TempDir::new().unwrap();
    posemark(&home)
        .arg("--source")
        .arg("clip.mp4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_unopenable_source_leaves_no_output() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let out_dir = work.path().join("results");
    let video = out_dir.join("out.mp4");
    let json = out_dir.join("out.json");

    posemark(&home)
        .arg("--source")
        .arg(work.path().join("does-not-exist.mp4"))
        .arg("--out")
        .arg(&video)
        .arg("--json")
        .arg(&json)
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("[OK]").not())
        .stderr(predicate::str::contains("error: could not open video source"));

    assert!(!video.exists());
    assert!(!json.exists());
    assert!(!out_dir.exists());
}

#[test]
fn test_directory_source_rejected() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let json = work.path().join("out.json");

    posemark(&home)
        .arg("--source")
        .arg(work.path())
        .arg("--out")
        .arg(work.path().join("out.mp4"))
        .arg("--json")
        .arg(&json)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open video source"));

    assert!(!json.exists());
}

#[test]
fn test_invalid_confidence_rejected() {
    let home = TempDir::new().unwrap();
    posemark(&home)
        .args(["--source", "a.mp4", "--out", "b.mp4", "--json", "c.json"])
        .args(["--conf", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confidence must be between"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_invalid_config_file_reported() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("posemark");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[defaults]\nconfidence = 3.0\n").unwrap();

    posemark(&home)
        .args(["--source", "a.mp4", "--out", "b.mp4", "--json", "c.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confidence must be between"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_path_and_init() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join("posemark").join("config.toml");

    posemark(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().as_ref()));

    posemark(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(expected.is_file());

    posemark(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    posemark(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bytetrack.yaml"));
}
