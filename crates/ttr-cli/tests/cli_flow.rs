//! End-to-end integration tests for the complete tracking flow.
//!
//! Tests the full pipeline through the compiled binary: add tasks, start
//! and stop sessions, report, export, edit entries, back up.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn ttr_binary() -> String {
    env!("CARGO_BIN_EXE_ttr").to_string()
}

/// Writes a config file pointing at a temp database and returns its path.
fn write_config(temp: &Path, single_active: bool) -> PathBuf {
    let config_file = temp.join("config.toml");
    let db_file = temp.join("ttr.db");
    let backup_dir = temp.join("backups");
    std::fs::write(
        &config_file,
        format!(
            "database_path = \"{}\"\nbackup_dir = \"{}\"\nsingle_active = {single_active}\n",
            db_file.display(),
            backup_dir.display()
        ),
    )
    .unwrap();
    config_file
}

fn ttr(config: &Path, args: &[&str]) -> Output {
    Command::new(ttr_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run ttr")
}

fn assert_success(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn task_add_and_list_round_trip() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["task", "add", "deep work", "--important"]));
    assert_success(&ttr(&config, &["task", "add", "email"]));

    let listing = assert_success(&ttr(&config, &["task", "list"]));
    let deep = listing.find("deep work").expect("deep work listed");
    let email = listing.find("email").expect("email listed");
    assert!(deep < email, "important task sorts first:\n{listing}");
}

#[test]
fn adding_the_same_task_twice_reuses_it() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["task", "add", "repeat"]));
    let second = assert_success(&ttr(&config, &["task", "add", "repeat"]));
    assert!(second.contains("already exists"), "got: {second}");

    let listing = assert_success(&ttr(&config, &["task", "list"]));
    assert_eq!(listing.matches("repeat").count(), 1);
}

#[test]
fn exclusive_start_switches_the_running_task() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    // `start` defines tasks on first use.
    assert_success(&ttr(&config, &["start", "task a"]));
    let switch = assert_success(&ttr(&config, &["start", "task b"]));
    assert!(switch.contains("Stopped 'task a'"), "got: {switch}");
    assert!(switch.contains("Started 'task b'"), "got: {switch}");

    let status = assert_success(&ttr(&config, &["status"]));
    assert!(status.contains("Running:"));
    assert!(status.contains("task b"));
    assert_eq!(
        status.matches("since").count(),
        1,
        "exactly one running session:\n{status}"
    );
}

#[test]
fn per_task_mode_runs_sessions_concurrently() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), false);

    assert_success(&ttr(&config, &["start", "task a"]));
    let second = assert_success(&ttr(&config, &["start", "task b"]));
    assert!(
        !second.contains("Stopped"),
        "no auto-switch in per-task mode: {second}"
    );

    let status = assert_success(&ttr(&config, &["status"]));
    assert_eq!(status.matches("since").count(), 2, "both running:\n{status}");

    let paused = assert_success(&ttr(&config, &["pause"]));
    assert!(paused.contains("Stopped 2 session(s)."), "got: {paused}");
}

#[test]
fn starting_twice_is_a_benign_noop() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["start", "once"]));
    let again = assert_success(&ttr(&config, &["start", "once"]));
    assert!(again.contains("already running"), "got: {again}");
}

#[test]
fn pause_with_nothing_running_reports_quietly() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    let output = assert_success(&ttr(&config, &["pause"]));
    assert!(output.contains("Nothing is running."));
}

#[test]
fn report_aggregates_today() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["start", "work"]));
    assert_success(&ttr(&config, &["stop", "work"]));

    let report = assert_success(&ttr(&config, &["report"]));
    assert!(report.starts_with("DAILY REPORT:"), "got: {report}");
    assert!(report.contains("work"));
    assert!(report.contains("Total:"));

    let json = assert_success(&ttr(&config, &["report", "--json"]));
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON report");
    assert_eq!(parsed["task_count"], 1);
    assert_eq!(parsed["tasks"][0]["task_name"], "work");
}

#[test]
fn export_writes_a_csv_file() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);
    let out = temp.path().join("summary.csv");

    assert_success(&ttr(&config, &["start", "exported"]));
    assert_success(&ttr(&config, &["stop"]));

    assert_success(&ttr(
        &config,
        &["export", "--out", out.to_str().unwrap()],
    ));

    let csv = std::fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("task,important,hours"));
    assert!(csv.contains("exported"));
    assert!(csv.lines().last().unwrap().starts_with("Total,,"));
}

#[test]
fn entry_edit_validates_and_refiles() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["start", "editable"]));
    assert_success(&ttr(&config, &["stop"]));

    // Inverted interval is rejected with a structured message.
    let rejected = ttr(
        &config,
        &[
            "entry",
            "edit",
            "1",
            "--start",
            "2024-01-15T10:00:00",
            "--end",
            "2024-01-15T09:00:00",
        ],
    );
    assert!(!rejected.status.success());
    let stderr = String::from_utf8_lossy(&rejected.stderr);
    assert!(
        stderr.contains("does not follow"),
        "should explain the rejection: {stderr}"
    );

    // A valid edit recomputes and refiles under the new date.
    let edited = assert_success(&ttr(
        &config,
        &[
            "entry",
            "edit",
            "1",
            "--start",
            "2024-01-15T09:00:00",
            "--end",
            "2024-01-15T10:30:00",
        ],
    ));
    assert!(edited.contains("1.50h on 2024-01-15"), "got: {edited}");

    let day = assert_success(&ttr(&config, &["day", "--date", "2024-01-15"]));
    assert!(day.contains("editable"), "refiled entry listed: {day}");
}

#[test]
fn deleting_a_missing_entry_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    // Touch the database first so the error is about the entry.
    assert_success(&ttr(&config, &["task", "add", "anything"]));

    let output = ttr(&config, &["entry", "del", "42"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no entry with id 42"), "got: {stderr}");
}

#[test]
fn placeholder_entries_appear_on_the_day_sheet() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["task", "add", "placeholder"]));
    assert_success(&ttr(
        &config,
        &["entry", "add-empty", "placeholder", "--date", "2024-03-01"],
    ));

    let day = assert_success(&ttr(&config, &["day", "--date", "2024-03-01"]));
    assert!(day.contains("placeholder"));
    assert!(day.contains("0.00"));
}

#[test]
fn backup_copies_the_database() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["task", "add", "saved"]));
    let output = assert_success(&ttr(&config, &["backup"]));
    assert!(output.contains("Backup created:"), "got: {output}");

    let backups: Vec<_> = std::fs::read_dir(temp.path().join("backups"))
        .unwrap()
        .collect();
    assert_eq!(backups.len(), 1);

    // A cadence-gated backup right after is skipped.
    let skipped = assert_success(&ttr(&config, &["backup", "--max-age-days", "7"]));
    assert!(skipped.contains("Backup skipped"), "got: {skipped}");
}

#[test]
fn database_survives_between_invocations() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), true);

    assert_success(&ttr(&config, &["start", "persistent"]));

    // A separate process sees the open session: an entry left open is a
    // valid state, recovered rather than discarded.
    let status = assert_success(&ttr(&config, &["status"]));
    assert!(status.contains("persistent"));
    assert!(status.contains("Running:"));

    let stopped = assert_success(&ttr(&config, &["stop"]));
    assert!(stopped.contains("Stopped 'persistent'"));
}
