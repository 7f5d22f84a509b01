use chrono::NaiveDate;
use study_planner::export::{parse_csv_export, parse_json_export};
use study_planner::{Difficulty, ExportFormat, NewTask, Planner, TaskRecord, TaskStatus};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn planner_with_tasks() -> Planner {
    let mut planner = Planner::new();
    planner
        .add_task(
            NewTask::topic("Calculus", "Limits, derivatives", Difficulty::Medium, 4.0, "Math")
                .created_on(d(2024, 9, 1))
                .with_tag("exam"),
        )
        .unwrap();
    planner
        .add_task(
            NewTask::assignment("Java Project", "Build a \"todo\" app", Difficulty::Hard, 8.5, d(2024, 12, 15))
                .created_on(d(2024, 9, 3))
                .with_status(TaskStatus::InProgress),
        )
        .unwrap();
    planner
}

fn expected_records(planner: &Planner) -> Vec<TaskRecord> {
    planner.tasks().iter().map(TaskRecord::from).collect()
}

#[test]
fn json_export_reads_back_field_by_field() {
    let planner = planner_with_tasks();
    let document = planner.export_tasks(ExportFormat::Json).unwrap();
    let records = parse_json_export(&document).unwrap();

    assert_eq!(records, expected_records(&planner));
    assert_eq!(records[1].title, "Java Project");
    assert_eq!(records[1].estimated_hours, 8.5);
    assert_eq!(records[1].status, TaskStatus::InProgress);
    assert_eq!(records[0].tags, vec!["exam".to_string()]);

    let value: serde_json::Value = serde_json::from_str(&document).unwrap();
    assert_eq!(value["tasks"][0]["estimatedHours"], 4.0);
    assert_eq!(value["tasks"][1]["difficulty"], "HARD");
    assert_eq!(value["tasks"][1]["createdDate"], "2024-09-03");
}

#[test]
fn csv_export_has_header_and_one_line_per_task() {
    let planner = planner_with_tasks();
    let document = planner.export_tasks(ExportFormat::Csv).unwrap();
    let lines: Vec<&str> = document.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "id,title,description,difficulty,estimatedHours,status,createdDate,tags"
    );
    assert_eq!(
        lines[2],
        "2,Java Project,\"Build a \"\"todo\"\" app\",HARD,8.5,IN_PROGRESS,2024-09-03,"
    );
    assert_eq!(parse_csv_export(&document).unwrap(), expected_records(&planner));
}

#[test]
fn empty_planner_exports_header_only() {
    let planner = Planner::new();
    let csv = planner.export_tasks(ExportFormat::Csv).unwrap();
    assert_eq!(
        csv,
        "id,title,description,difficulty,estimatedHours,status,createdDate,tags\n"
    );
    let json = planner.export_tasks(ExportFormat::Json).unwrap();
    assert_eq!(json, "{\n  \"tasks\": [\n\n  ]\n}");
}

#[test]
fn write_export_creates_file() {
    let planner = planner_with_tasks();
    let file = NamedTempFile::new().unwrap();
    planner.write_export(ExportFormat::Json, file.path()).unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(contents, planner.export_tasks(ExportFormat::Json).unwrap());
}

#[test]
fn write_export_to_missing_directory_fails() {
    let planner = planner_with_tasks();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tasks.csv");
    assert!(planner.write_export(ExportFormat::Csv, &path).is_err());
}
