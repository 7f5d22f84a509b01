//! Task export as CSV or JSON documents, and parsers to read them back.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};
use crate::task::{Difficulty, StudyTask, TaskId, TaskStatus};

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "title",
    "description",
    "difficulty",
    "estimatedHours",
    "status",
    "createdDate",
    "tags",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn exporter(self) -> Box<dyn PlanExporter> {
        match self {
            ExportFormat::Csv => Box::new(CsvExporter),
            ExportFormat::Json => Box::new(JsonExporter),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("CSV"),
            ExportFormat::Json => f.write_str("JSON"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unsupported export format '{other}'")),
        }
    }
}

/// Flat, field-by-field view of a task as it appears in an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub status: TaskStatus,
    pub created_date: NaiveDate,
    pub tags: Vec<String>,
}

impl From<&StudyTask> for TaskRecord {
    fn from(task: &StudyTask) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            difficulty: task.difficulty,
            estimated_hours: task.estimated_hours,
            status: task.status,
            created_date: task.created_date,
            tags: task.tags.iter().cloned().collect(),
        }
    }
}

pub trait Exportable {
    /// Values in `CSV_HEADER` order.
    fn csv_fields(&self) -> Vec<String>;

    fn to_json(&self) -> serde_json::Value;
}

impl Exportable for TaskRecord {
    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.description.clone(),
            self.difficulty.to_string(),
            self.estimated_hours.to_string(),
            self.status.to_string(),
            self.created_date.format("%Y-%m-%d").to_string(),
            self.tags.join(";"),
        ]
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "difficulty": self.difficulty,
            "estimatedHours": self.estimated_hours,
            "status": self.status,
            "createdDate": self.created_date,
            "tags": self.tags,
        })
    }
}

impl Exportable for StudyTask {
    fn csv_fields(&self) -> Vec<String> {
        TaskRecord::from(self).csv_fields()
    }

    fn to_json(&self) -> serde_json::Value {
        TaskRecord::from(self).to_json()
    }
}

/// Document skeleton: header, items joined by the separator, footer.
pub trait PlanExporter {
    fn header(&self) -> PersistenceResult<String>;

    fn item(&self, item: &dyn Exportable) -> PersistenceResult<String>;

    fn separator(&self) -> &'static str;

    fn footer(&self) -> &'static str;

    fn export(&self, items: &[&dyn Exportable]) -> PersistenceResult<String> {
        let mut out = self.header()?;
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                out.push_str(self.separator());
            }
            out.push_str(&self.item(*item)?);
        }
        out.push_str(self.footer());
        Ok(out)
    }
}

pub struct CsvExporter;

impl PlanExporter for CsvExporter {
    fn header(&self) -> PersistenceResult<String> {
        let mut line = csv_line(CSV_HEADER.iter().copied())?;
        line.push('\n');
        Ok(line)
    }

    fn item(&self, item: &dyn Exportable) -> PersistenceResult<String> {
        let fields = item.csv_fields();
        csv_line(fields.iter().map(String::as_str))
    }

    fn separator(&self) -> &'static str {
        "\n"
    }

    fn footer(&self) -> &'static str {
        ""
    }
}

pub struct JsonExporter;

impl PlanExporter for JsonExporter {
    fn header(&self) -> PersistenceResult<String> {
        Ok("{\n  \"tasks\": [\n".to_string())
    }

    fn item(&self, item: &dyn Exportable) -> PersistenceResult<String> {
        Ok(format!("    {}", serde_json::to_string(&item.to_json())?))
    }

    fn separator(&self) -> &'static str {
        ",\n"
    }

    fn footer(&self) -> &'static str {
        "\n  ]\n}"
    }
}

/// One CSV record without its terminator, quoted where needed.
fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> PersistenceResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| PersistenceError::Io(err.into_error()))?;
    let line = String::from_utf8(bytes)
        .map_err(|err| PersistenceError::InvalidData(format!("non-utf8 csv output: {err}")))?;
    Ok(line.trim_end_matches('\n').to_string())
}

pub fn export_tasks(tasks: &[StudyTask], format: ExportFormat) -> PersistenceResult<String> {
    let items: Vec<&dyn Exportable> = tasks.iter().map(|t| t as &dyn Exportable).collect();
    format.exporter().export(&items)
}

#[derive(Deserialize)]
struct JsonExport {
    tasks: Vec<TaskRecord>,
}

pub fn parse_json_export(input: &str) -> PersistenceResult<Vec<TaskRecord>> {
    let document: JsonExport = serde_json::from_str(input)?;
    Ok(document.tasks)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskCsvRow {
    id: TaskId,
    title: String,
    description: String,
    difficulty: String,
    estimated_hours: f64,
    status: String,
    created_date: String,
    tags: String,
}

impl TaskCsvRow {
    fn into_record(self) -> PersistenceResult<TaskRecord> {
        Ok(TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            difficulty: self.difficulty.parse().map_err(PersistenceError::InvalidData)?,
            estimated_hours: self.estimated_hours,
            status: self.status.parse().map_err(PersistenceError::InvalidData)?,
            created_date: NaiveDate::parse_from_str(self.created_date.trim(), "%Y-%m-%d").map_err(
                |e| {
                    PersistenceError::InvalidData(format!(
                        "invalid date '{}': {e}",
                        self.created_date
                    ))
                },
            )?,
            tags: split_tags(&self.tags),
        })
    }
}

fn split_tags(input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    input.split(';').map(|s| s.trim().to_string()).collect()
}

pub fn parse_csv_export(input: &str) -> PersistenceResult<Vec<TaskRecord>> {
    let mut reader = csv::Reader::from_reader(input.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize::<TaskCsvRow>() {
        records.push(row?.into_record()?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;

    fn sample() -> Vec<StudyTask> {
        vec![
            NewTask::topic("Calculus", "Limits, derivatives", Difficulty::Medium, 4.0, "Math")
                .created_on(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
                .with_tag("exam")
                .with_tag("math")
                .into_task(1),
            NewTask::topic("Physics \"waves\"", "", Difficulty::Hard, 2.5, "Physics")
                .created_on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
                .into_task(2),
        ]
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("Json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!(" CSV ".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn json_has_no_trailing_separator() {
        let out = export_tasks(&sample(), ExportFormat::Json).unwrap();
        assert!(out.starts_with("{\n  \"tasks\": [\n    {"));
        assert!(out.ends_with("}\n  ]\n}"));
        assert_eq!(out.matches("},\n").count(), 1);
    }

    #[test]
    fn csv_quotes_fields_and_joins_tags() {
        let out = export_tasks(&sample(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "id,title,description,difficulty,estimatedHours,status,createdDate,tags"
        );
        assert_eq!(
            lines[1],
            "1,Calculus,\"Limits, derivatives\",MEDIUM,4,TODO,2024-09-01,exam;math"
        );
        assert_eq!(lines[2], "2,\"Physics \"\"waves\"\"\",,HARD,2.5,TODO,2024-09-02,");
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn csv_reads_back() {
        let tasks = sample();
        let out = export_tasks(&tasks, ExportFormat::Csv).unwrap();
        let records = parse_csv_export(&out).unwrap();
        let expected: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
        assert_eq!(records, expected);
    }

    #[test]
    fn empty_json_export_is_valid() {
        let out = export_tasks(&[], ExportFormat::Json).unwrap();
        assert!(parse_json_export(&out).unwrap().is_empty());
    }
}
