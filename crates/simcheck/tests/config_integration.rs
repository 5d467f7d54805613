//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. Tests use
//! `info --json` to assert actual config values, not just process success.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("SIMCHECK_LOG_DIR", std::env::temp_dir().join("simcheck-test-logs"));
    cmd
}

/// Run `info --json` from a directory and parse the JSON output.
fn info_json(dir: &std::path::Path) -> Value {
    info_json_with(cmd(), dir)
}

fn info_json_with(mut command: Command, dir: &std::path::Path) -> Value {
    let output = command
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert_eq!(
        json["config"]["log_level"], "info",
        "should use default log level"
    );
    assert!(
        json["config"]["config_file"].is_null(),
        "no config file should be reported"
    );
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "ngram_size = 3\n").unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["ngram_size"], 3);
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with(".simcheck.toml"),
        "should report dotfile: {reported}"
    );
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    fs::write(tmp.path().join("simcheck.toml"), "mode = \"vector\"\n").unwrap();

    let json = info_json(&nested);
    assert_eq!(json["config"]["mode"], "vector");
}

#[test]
fn regular_name_overrides_dotfile() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "min_coverage = 1.0\n").unwrap();
    fs::write(tmp.path().join("simcheck.toml"), "min_coverage = 7.5\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["min_coverage"], 7.5);
}

// =============================================================================
// Formats
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".simcheck.yaml"),
        "corpus_dirs:\n  - refs\ncorpus_extensions: [txt]\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["corpus_dirs"][0], "refs");
    assert_eq!(json["config"]["corpus_extensions"], serde_json::json!(["txt"]));
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".simcheck.json"),
        r#"{"document_base_url": "https://example.org/docs", "allow_overlap": true}"#,
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["document_base_url"], "https://example.org/docs");
    assert_eq!(json["config"]["allow_overlap"], true);
}

#[test]
fn disable_input_limit_reports_null_limit() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "disable_input_limit = true\n").unwrap();

    let json = info_json(tmp.path());
    assert!(json["config"]["max_input_bytes"].is_null());
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "ngram_size = 3\n").unwrap();
    let explicit = tmp.path().join("custom.toml");
    fs::write(&explicit, "ngram_size = 9\n").unwrap();

    let mut command = cmd();
    command.args(["--config", explicit.to_str().unwrap()]);
    let json = info_json_with(command, tmp.path());

    assert_eq!(json["config"]["ngram_size"], 9);
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(reported.ends_with("custom.toml"));
}

#[test]
fn env_var_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "mode = \"phrase\"\n").unwrap();

    let mut command = cmd();
    command.env("SIMCHECK_MODE", "vector");
    let json = info_json_with(command, tmp.path());

    assert_eq!(json["config"]["mode"], "vector");
}

#[test]
fn config_drives_compare_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("refs")).unwrap();
    fs::write(tmp.path().join("refs").join("one.txt"), "alpha beta gamma").unwrap();
    fs::write(tmp.path().join("draft.txt"), "alpha beta delta").unwrap();
    fs::write(
        tmp.path().join(".simcheck.toml"),
        "mode = \"vector\"\ncorpus_dirs = [\"refs\"]\ndocument_base_url = \"https://host/files/\"\n",
    )
    .unwrap();

    let output = cmd()
        .current_dir(tmp.path())
        .args(["compare", "draft.txt", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "vector");
    assert_eq!(json["documents"][0]["location"], "https://host/files/one.txt");
}

// =============================================================================
// Errors & Boundaries
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "ngram_size = [not valid").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn invalid_mode_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "mode = \"fuzzy\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".simcheck.toml"),
        "ngram_size = 4\nsome_future_option = true\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["ngram_size"], 4);
}

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "ngram_size = 8\n").unwrap();
    let repo = tmp.path().join("repo");
    let work = repo.join("src");
    fs::create_dir_all(repo.join(".git")).unwrap();
    fs::create_dir_all(&work).unwrap();

    let json = info_json(&work);
    assert_ne!(json["config"]["ngram_size"], 8);
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    fs::write(tmp.path().join(".simcheck.toml"), "ngram_size = 6\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["ngram_size"], 6);
}
