use std::collections::HashSet;

use crate::error::ValidationError;
use crate::session::{NewSession, Session};
use crate::task::{NewTask, StudyTask};

/// Rule set run before an entity is admitted into the planner.
pub trait Validate {
    const ENTITY: &'static str;

    /// Every violated rule, in rule order. Empty means valid.
    fn validation_errors(&self) -> Vec<String>;

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(Self::ENTITY, errors))
        }
    }
}

fn task_rules(title: &str, estimated_hours: f64) -> Vec<String> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push("title must not be empty".to_string());
    }
    if !estimated_hours.is_finite() || estimated_hours <= 0.0 {
        errors.push(format!(
            "estimated hours must be positive (got {estimated_hours})"
        ));
    }
    errors
}

fn session_rules(start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) -> Vec<String> {
    if start < end {
        Vec::new()
    } else {
        vec![format!(
            "session must end after it starts ({} >= {})",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        )]
    }
}

impl Validate for NewTask {
    const ENTITY: &'static str = "task";

    fn validation_errors(&self) -> Vec<String> {
        task_rules(&self.title, self.estimated_hours)
    }
}

impl Validate for StudyTask {
    const ENTITY: &'static str = "task";

    fn validation_errors(&self) -> Vec<String> {
        let mut errors = task_rules(&self.title, self.estimated_hours);
        if self.dependencies.contains(&self.id) {
            errors.push(format!("task {} depends on itself", self.id));
        }
        errors
    }
}

impl Validate for NewSession {
    const ENTITY: &'static str = "session";

    fn validation_errors(&self) -> Vec<String> {
        session_rules(self.start, self.end)
    }
}

impl Validate for Session {
    const ENTITY: &'static str = "session";

    fn validation_errors(&self) -> Vec<String> {
        session_rules(self.start, self.end)
    }
}

/// Checks stored tasks as a whole: unique ids, per-task rules, known prerequisites.
pub fn validate_task_collection(tasks: &[StudyTask]) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            errors.push(format!("duplicate task id {}", task.id));
        }
        errors.extend(
            task.validation_errors()
                .into_iter()
                .map(|e| format!("task {}: {e}", task.id)),
        );
    }
    for task in tasks {
        for prerequisite in &task.dependencies {
            if !seen_ids.contains(prerequisite) {
                errors.push(format!(
                    "task {} depends on unknown task {prerequisite}",
                    task.id
                ));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new("task collection", errors))
    }
}

pub fn validate_session_collection(sessions: &[Session]) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::with_capacity(sessions.len());
    for session in sessions {
        if !seen_ids.insert(session.id) {
            errors.push(format!("duplicate session id {}", session.id));
        }
        errors.extend(
            session
                .validation_errors()
                .into_iter()
                .map(|e| format!("session {}: {e}", session.id)),
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new("session collection", errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Difficulty;
    use chrono::NaiveDate;

    #[test]
    fn collects_every_violated_task_rule() {
        let draft = NewTask::topic("   ", "", Difficulty::Easy, 0.0, "Math");
        let err = draft.validate().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.to_string().starts_with("task validation failed"));
    }

    #[test]
    fn rejects_non_finite_hours() {
        let draft = NewTask::topic("Calculus", "", Difficulty::Easy, f64::NAN, "Math");
        assert!(!draft.is_valid());
    }

    #[test]
    fn session_must_end_after_start() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(!NewSession::study(1, at, at, "Library").is_valid());
    }

    #[test]
    fn collection_reports_duplicates_and_unknown_prerequisites() {
        let mut a = NewTask::topic("A", "", Difficulty::Easy, 1.0, "Math").into_task(1);
        let b = NewTask::topic("B", "", Difficulty::Easy, 1.0, "Math").into_task(1);
        a.dependencies.insert(9);
        let err = validate_task_collection(&[a, b]).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.errors[0].contains("duplicate task id 1"));
        assert!(err.errors[1].contains("unknown task 9"));
    }
}
