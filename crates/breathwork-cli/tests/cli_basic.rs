//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathwork"))
        .env("BREATHWORK_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

fn created_id(stdout: &str) -> String {
    stdout
        .trim()
        .strip_prefix("Pattern created: ")
        .expect("create output")
        .to_string()
}

#[test]
fn test_patterns_list_shows_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["patterns", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("box-breathing"));
    assert!(stdout.contains("4-7-8"));
    assert!(stdout.contains("equal-breathing"));
}

#[test]
fn test_patterns_add_edit_delete() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &[
            "patterns", "add", "--name", "Calm", "--inhale", "4", "--hold", "0", "--exhale", "6",
            "--hold-empty", "0", "--sets", "5",
        ],
    );
    assert_eq!(code, 0, "add failed: {stderr}");
    let id = created_id(&stdout);
    assert!(id.starts_with("custom-"));

    let listed = run_json(dir.path(), &["patterns", "list", "--json"]);
    let patterns = listed.as_array().unwrap();
    assert_eq!(patterns.len(), 4);
    assert_eq!(patterns[3]["id"], id.as_str());
    assert_eq!(patterns[3]["total_duration"], 10);

    let (code, _, stderr) = run_cli(dir.path(), &["patterns", "edit", &id, "--hold", "2"]);
    assert_eq!(code, 0, "edit failed: {stderr}");
    let shown = run_json(dir.path(), &["patterns", "show", &id]);
    assert_eq!(shown["name"], "Calm");
    assert_eq!(shown["total_duration"], 12);
    assert_eq!(shown["steps"].as_array().unwrap().len(), 3);

    let (code, _, _) = run_cli(dir.path(), &["patterns", "delete", &id]);
    assert_eq!(code, 0);
    let (code, _, stderr) = run_cli(dir.path(), &["patterns", "show", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"), "unexpected stderr: {stderr}");
}

#[test]
fn test_patterns_add_clamps_durations() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["patterns", "add", "--name", "Wide", "--inhale", "70", "--hold", "-5", "--exhale", "8", "--sets", "999"],
    );
    assert_eq!(code, 0, "add failed: {stderr}");
    let shown = run_json(dir.path(), &["patterns", "show", &created_id(&stdout)]);
    assert_eq!(shown["total_duration"], 60 + 8 + 4);
    assert_eq!(shown["default_sets"], 300);
    assert_eq!(shown["steps"].as_array().unwrap().len(), 3);
}

#[test]
fn test_patterns_add_starts_from_form_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["patterns", "add", "--name", "Square"]);
    assert_eq!(code, 0, "add failed: {stderr}");
    let shown = run_json(dir.path(), &["patterns", "show", &created_id(&stdout)]);
    assert_eq!(shown["total_duration"], 16);
    assert_eq!(shown["default_sets"], 10);
    let phases: Vec<&str> = shown["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["phase"].as_str().unwrap())
        .collect();
    assert_eq!(phases, vec!["inhale", "hold", "exhale", "hold-empty"]);
}

#[test]
fn test_patterns_add_requires_name() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["patterns", "add", "--inhale", "4"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "unexpected stderr: {stderr}");
    assert!(!dir.path().join("patterns.toml").exists());
}

#[test]
fn test_patterns_add_rejects_all_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &[
            "patterns", "add", "--name", "Nothing", "--inhale", "0", "--hold", "0", "--exhale", "0",
            "--hold-empty", "0",
        ],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_builtin_cannot_be_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["patterns", "delete", "box-breathing"]);
    assert_eq!(code, 1);
    let (code, stdout, _) = run_cli(dir.path(), &["patterns", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("box-breathing"));
}

#[test]
fn test_session_preview_json() {
    let dir = tempfile::tempdir().unwrap();
    let timeline = run_json(
        dir.path(),
        &["session", "preview", "box-breathing", "--sets", "2", "--json"],
    );
    assert_eq!(timeline["target_sets"], 2);
    assert_eq!(timeline["finished_at_secs"], 32);
    let entries = timeline["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[4]["at_secs"], 16);
    assert_eq!(entries[4]["set"], 2);
    assert_eq!(entries[4]["phase"], "inhale");
}

#[test]
fn test_session_preview_uses_configured_sets() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "session.default_sets_override", "3"]);
    assert_eq!(code, 0);

    let timeline = run_json(dir.path(), &["session", "preview", "equal-breathing", "--json"]);
    assert_eq!(timeline["target_sets"], 3);
    assert_eq!(timeline["finished_at_secs"], 24);

    let timeline = run_json(
        dir.path(),
        &["session", "preview", "equal-breathing", "--sets", "1", "--json"],
    );
    assert_eq!(timeline["target_sets"], 1);
}

#[test]
fn test_session_preview_unknown_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["session", "preview", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nope"));
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "haptics.enabled"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "haptics.enabled", "false"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "haptics.enabled"]);
    assert_eq!(stdout.trim(), "false");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "config reset to defaults");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert!(stdout.contains("haptics.enabled = true"));
}

#[test]
fn test_config_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "nope.key", "1"]);
    assert_eq!(code, 1);
    let (code, _, _) = run_cli(dir.path(), &["config", "get", "nope.key"]);
    assert_eq!(code, 1);
}
