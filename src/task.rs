use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::member::MemberId;

pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Ordinal rank used when sorting the revision queue (EASY = 1).
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Expert => "EXPERT",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            "EXPERT" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Revised,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
            TaskStatus::Revised => "REVISED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            "REVISED" => Ok(TaskStatus::Revised),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

/// Variant-specific data of a study task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    Topic {
        subject: String,
        #[serde(default = "default_priority")]
        priority: u32,
    },
    Assignment {
        due_date: NaiveDate,
        #[serde(default = "default_max_score")]
        max_score: f64,
    },
}

fn default_priority() -> u32 {
    1
}

fn default_max_score() -> f64 {
    100.0
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A task that has not been admitted by the planner yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub kind: TaskKind,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default = "today")]
    pub created_date: NaiveDate,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub assigned_to: Option<MemberId>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

impl NewTask {
    pub fn topic(
        title: impl Into<String>,
        description: impl Into<String>,
        difficulty: Difficulty,
        estimated_hours: f64,
        subject: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            title,
            description,
            difficulty,
            estimated_hours,
            TaskKind::Topic {
                subject: subject.into(),
                priority: default_priority(),
            },
        )
    }

    pub fn assignment(
        title: impl Into<String>,
        description: impl Into<String>,
        difficulty: Difficulty,
        estimated_hours: f64,
        due_date: NaiveDate,
    ) -> Self {
        Self::with_kind(
            title,
            description,
            difficulty,
            estimated_hours,
            TaskKind::Assignment {
                due_date,
                max_score: default_max_score(),
            },
        )
    }

    fn with_kind(
        title: impl Into<String>,
        description: impl Into<String>,
        difficulty: Difficulty,
        estimated_hours: f64,
        kind: TaskKind,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            difficulty,
            estimated_hours,
            kind,
            status: TaskStatus::Todo,
            created_date: today(),
            tags: BTreeSet::new(),
            assigned_to: None,
        }
    }

    pub fn created_on(mut self, date: NaiveDate) -> Self {
        self.created_date = date;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn assigned_to(mut self, member: MemberId) -> Self {
        self.assigned_to = Some(member);
        self
    }

    pub(crate) fn into_task(self, id: TaskId) -> StudyTask {
        StudyTask {
            id,
            title: self.title,
            description: self.description,
            difficulty: self.difficulty,
            estimated_hours: self.estimated_hours,
            kind: self.kind,
            status: self.status,
            created_date: self.created_date,
            dependencies: BTreeSet::new(),
            tags: self.tags,
            assigned_to: self.assigned_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyTask {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: f64,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub created_date: NaiveDate,
    /// Prerequisites of this task.
    #[serde(default)]
    pub dependencies: BTreeSet<TaskId>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub assigned_to: Option<MemberId>,
}

impl StudyTask {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn subject(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Topic { subject, .. } => Some(subject),
            TaskKind::Assignment { .. } => None,
        }
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        match self.kind {
            TaskKind::Assignment { due_date, .. } => Some(due_date),
            TaskKind::Topic { .. } => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            TaskKind::Topic { .. } => "TOPIC",
            TaskKind::Assignment { .. } => "ASSIGNMENT",
        }
    }
}

impl fmt::Display for StudyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{}] ({}, {}h, {})",
            self.id,
            self.title,
            self.kind_label(),
            self.difficulty,
            self.estimated_hours,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_orders_by_level() {
        let mut levels = vec![Difficulty::Expert, Difficulty::Easy, Difficulty::Hard];
        levels.sort();
        assert_eq!(
            levels,
            vec![Difficulty::Easy, Difficulty::Hard, Difficulty::Expert]
        );
        assert_eq!(Difficulty::Medium.level(), 2);
    }

    #[test]
    fn status_parses_loose_spellings() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn assignment_defaults_max_score() {
        let due = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let task = NewTask::assignment("Java Project", "OOP", Difficulty::Hard, 8.0, due)
            .into_task(7);
        assert_eq!(task.due_date(), Some(due));
        assert_eq!(
            task.kind,
            TaskKind::Assignment {
                due_date: due,
                max_score: 100.0
            }
        );
        assert_eq!(task.subject(), None);
    }
}
