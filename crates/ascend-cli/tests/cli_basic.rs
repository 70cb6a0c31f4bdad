//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "ascend-cli", "--"])
        .args(args)
        .env("ASCEND_DATA_DIR", data_dir)
        .env_remove("ASCEND_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn events(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn has_event(stdout: &str, kind: &str) -> bool {
    events(stdout).iter().any(|e| e["type"] == kind)
}

#[test]
fn test_status_on_fresh_profile() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["status", "--json"]);
    assert_eq!(code, 0, "status failed");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["level"], 1);
    assert_eq!(parsed["xp"], 0);
    assert_eq!(parsed["coins"], 0);
}

#[test]
fn test_daily_add_complete_and_list() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["daily", "add", "Stretch", "--xp", "10", "--id", "d1"]);
    assert_eq!(code, 0, "daily add failed");
    assert!(has_event(&stdout, "QuestCreated"));

    let (code, stdout, _) = run_cli(dir.path(), &["daily", "complete", "d1"]);
    assert_eq!(code, 0, "daily complete failed");
    assert!(has_event(&stdout, "XpGained"));
    assert!(has_event(&stdout, "QuestCompleted"));

    let (code, stdout, _) = run_cli(dir.path(), &["daily", "list", "--json"]);
    assert_eq!(code, 0, "daily list failed");
    let quests: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(quests[0]["id"], "d1");
    assert_eq!(quests[0]["completed"], true);

    let (_, stdout, _) = run_cli(dir.path(), &["status", "--json"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["xp"], 10);
}

#[test]
fn test_rejected_operation_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["daily", "add", "Read", "--id", "d1"]);

    // Nothing to undo yet.
    let (code, stdout, stderr) = run_cli(dir.path(), &["daily", "undo", "d1"]);
    assert_eq!(code, 1);
    assert!(has_event(&stdout, "OperationRejected"));
    assert!(stderr.contains("error:"));
}

#[test]
fn test_reset_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["side", "add", "Big task", "--xp", "100", "--id", "s1"]);
    run_cli(dir.path(), &["side", "complete", "s1"]);

    let (code, _, _) = run_cli(dir.path(), &["reset"]);
    assert_eq!(code, 1, "reset without --confirm must fail");

    let (code, stdout, _) = run_cli(dir.path(), &["reset", "--confirm"]);
    assert_eq!(code, 0);
    assert!(has_event(&stdout, "ProfileReset"));

    let (_, stdout, _) = run_cli(dir.path(), &["status", "--json"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["xp"], 0);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "display.countdown_style"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "compact");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "calendar.utc_offset_minutes", "120"]);
    assert_eq!(code, 0, "config set failed");

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "calendar.utc_offset_minutes"]);
    assert_eq!(stdout.trim(), "120");

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "no.such_key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0, "completions failed");
    assert!(stdout.contains("ascend-cli"));
}

#[test]
fn test_avatar_buy_and_select() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["avatar", "buy", "troll"]);
    assert_eq!(code, 1, "buying without coins must fail");
    assert!(has_event(&stdout, "OperationRejected"));

    let (code, stdout, _) = run_cli(dir.path(), &["avatar", "select", "male-teacher"]);
    assert_eq!(code, 0, "free avatar select failed");
    assert!(has_event(&stdout, "AvatarSelected"));

    let (_, stdout, _) = run_cli(dir.path(), &["avatar", "list", "--json"]);
    let avatars: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let teacher = avatars
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "male-teacher")
        .unwrap();
    assert_eq!(teacher["selected"], true);
}

#[test]
fn test_log_records_todays_xp() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["side", "add", "Errand", "--xp", "20", "--id", "s1"]);
    run_cli(dir.path(), &["side", "complete", "s1"]);

    let (code, stdout, _) = run_cli(dir.path(), &["log", "--json"]);
    assert_eq!(code, 0, "log failed");
    let log: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let today = log.as_object().unwrap().values().next().unwrap();
    assert_eq!(today["xp"], 20);
    assert_eq!(today["completed"]["side"], 1);
}
