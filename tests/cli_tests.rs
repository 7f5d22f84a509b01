#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("STUDY_PLANNER_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_adds_topic_and_assignment() {
    run_cli("topic medium 4 Math Calculus I\nassignment hard 8 2025-12-15 Java Project\ntasks\nquit\n")
        .success()
        .stdout(str_contains("Task added with ID: 1"))
        .stdout(str_contains("Task added with ID: 2"))
        .stdout(str_contains("#1 Calculus I [TOPIC] (MEDIUM, 4h, TODO)"));
}

#[test]
fn cli_rejects_invalid_task() {
    run_cli("topic easy 0 Math Empty hours\ntasks\nquit\n")
        .success()
        .stdout(str_contains("estimated hours must be positive"))
        .stdout(str_contains("No tasks yet."));
}

#[test]
fn cli_refuses_dependency_cycle() {
    run_cli("topic easy 1 Math A\ntopic easy 1 Math B\ndepend 2 1\ndepend 1 2\norder\nquit\n")
        .success()
        .stdout(str_contains("Task 2 now depends on task 1."))
        .stdout(str_contains("would create a cycle"))
        .stdout(str_contains("Study order: 1 -> 2"));
}

#[test]
fn cli_reports_conflicts() {
    run_cli(
        "topic easy 1 Math A\nsession 1 2025-01-05 09:00 2 Library\nsession 1 2025-01-05 10:00 2 Library\nconflicts\nquit\n",
    )
    .success()
    .stdout(str_contains("Session scheduled with ID: 2"))
    .stdout(str_contains("Conflicts detected:"))
    .stdout(str_contains("- Time conflict between sessions 1 and 2"));
}

#[test]
fn cli_rejects_out_of_range_session_length() {
    run_cli("topic easy 1 Math A\nsession 1 2025-03-10 09:00 1e15\nsession 1 2025-03-10 09:00 inf\nsession 1 2025-03-10 09:00 1 Library\nquit\n")
        .success()
        .stdout(str_contains("session duration out of range (1000000000000000 hours)"))
        .stdout(str_contains("session duration out of range (inf hours)"))
        .stdout(str_contains("Session scheduled with ID: 1"));
}

#[test]
fn cli_without_sessions_has_no_conflicts() {
    run_cli("conflicts\nquit\n")
        .success()
        .stdout(str_contains("No conflicts detected! Your schedule looks good."));
}

#[test]
fn cli_sample_data_and_group() {
    run_cli("sample\ngroup\nquit\n")
        .success()
        .stdout(str_contains("Group: Main Study Group"))
        .stdout(str_contains("Total members: 2"))
        .stdout(str_contains("Leader: Alice"));
}

#[test]
fn cli_progress_report() {
    run_cli("topic medium 4 Math A\ntopic hard 2 Math B\nstatus 1 done\nprogress\nquit\n")
        .success()
        .stdout(str_contains("Completion Rate: 50.0%"))
        .stdout(str_contains("PRODUCTIVITY HEATMAP (Last 7 Days)"));
}

#[test]
fn cli_logs_activity() {
    run_cli("member Alice alice@example.com Student\ntopic easy 1 Math Sets\nlogs\nquit\n")
        .success()
        .stdout(str_contains(" - Member added: Alice"))
        .stdout(str_contains(" - Task added: Sets"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "topic easy 1 Math TaskPersist\nsave {path}\ntopic easy 1 Math Scratchpad\nload {path}\ntasks\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Planner loaded from"));
    let after_reload = output
        .split("Planner loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("TaskPersist"));
    assert!(
        !after_reload.contains("Scratchpad"),
        "temporary task should not appear after reload:\n{after_reload}"
    );
}

#[test]
fn cli_exports_csv_to_stdout() {
    run_cli("topic easy 1 Math Sets\nexport csv\nquit\n")
        .success()
        .stdout(str_contains(
            "id,title,description,difficulty,estimatedHours,status,createdDate,tags",
        ))
        .stdout(str_contains("1,Sets,,EASY,1,TODO,"));
}

#[test]
fn cli_switches_algorithm() {
    run_cli("algorithm supermemo\nquit\n")
        .success()
        .stdout(str_contains("Revision algorithm set to supermemo."));
}
