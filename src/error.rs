//! Error types shared by the planner, its persistence layer and listeners.

use std::io;

use thiserror::Error;

use crate::task::TaskId;

/// Rule-set failure for an entity that was refused by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} validation failed: {}", errors.join("; "))]
pub struct ValidationError {
    pub entity: &'static str,
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(entity: &'static str, errors: Vec<String>) -> Self {
        Self { entity, errors }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("task {task} cannot depend on task {prerequisite}: the dependency would create a cycle")]
    CyclicDependency { task: TaskId, prerequisite: TaskId },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl PlannerError {
    pub fn not_found(kind: &'static str, id: u32) -> Self {
        Self::NotFound { kind, id }
    }
}

/// Failure reported by a single listener while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_rule() {
        let err = ValidationError::new(
            "task",
            vec![
                "Title cannot be empty".into(),
                "Estimated hours must be positive".into(),
            ],
        );
        assert_eq!(
            err.to_string(),
            "task validation failed: Title cannot be empty; Estimated hours must be positive"
        );
    }

    #[test]
    fn cyclic_dependency_names_both_tasks() {
        let err = PlannerError::CyclicDependency {
            task: 2,
            prerequisite: 1,
        };
        assert!(err.to_string().contains("task 2 cannot depend on task 1"));
    }
}
