//! Typed change notifications and the listeners that receive them.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ListenerError;
use crate::member::MemberId;
use crate::resource::ResourceId;
use crate::session::SessionId;
use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlannerEvent {
    TaskAdded { id: TaskId, title: String },
    SessionAdded { id: SessionId, task_id: TaskId },
    MemberAdded { id: MemberId, name: String },
    ResourceAdded { id: ResourceId, name: String },
    RevisionCompleted { task_id: TaskId },
    DependencyAdded { task: TaskId, prerequisite: TaskId },
    ConflictResolutionAttempted { conflict_id: String },
    AlgorithmChanged { name: String },
    StateRestored,
}

impl PlannerEvent {
    pub fn message(&self) -> String {
        match self {
            PlannerEvent::TaskAdded { title, .. } => format!("Task added: {title}"),
            PlannerEvent::SessionAdded { task_id, .. } => {
                format!("Session added for task ID: {task_id}")
            }
            PlannerEvent::MemberAdded { name, .. } => format!("Member added: {name}"),
            PlannerEvent::ResourceAdded { name, .. } => format!("Resource added: {name}"),
            PlannerEvent::RevisionCompleted { task_id } => {
                format!("Revision completed for task ID: {task_id}")
            }
            PlannerEvent::DependencyAdded { task, prerequisite } => {
                format!("Dependency added: task {task} depends on {prerequisite}")
            }
            PlannerEvent::ConflictResolutionAttempted { conflict_id } => {
                format!("Attempting to resolve conflict: {conflict_id}")
            }
            PlannerEvent::AlgorithmChanged { name } => format!("Revision algorithm set to {name}"),
            PlannerEvent::StateRestored => "Planner state restored".to_string(),
        }
    }
}

impl fmt::Display for PlannerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receives every event in registration order. An error here never stops
/// delivery to the listeners registered after this one.
pub trait PlannerListener: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&mut self, event: &PlannerEvent) -> Result<(), ListenerError>;
}

impl fmt::Debug for dyn PlannerListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlannerListener({})", self.name())
    }
}

impl PlannerListener for Sender<PlannerEvent> {
    fn name(&self) -> &str {
        "channel"
    }

    fn on_event(&mut self, event: &PlannerEvent) -> Result<(), ListenerError> {
        self.send(event.clone())
            .map_err(|_| ListenerError::new("event channel receiver dropped"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub listener: String,
    pub event: PlannerEvent,
    pub error: ListenerError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Append-only activity log. Clones share the same entries, so one handle can
/// be registered on the planner while another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Local::now().naive_local(),
            message: message.into(),
        };
        self.entries.lock().push(entry);
    }

    /// Formatted as `YYYY-MM-DD HH:MM:SS - message`.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().iter().map(ToString::to_string).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries[skip..].iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl PlannerListener for ActivityLog {
    fn name(&self) -> &str {
        "activity-log"
    }

    fn on_event(&mut self, event: &PlannerEvent) -> Result<(), ListenerError> {
        self.record(event.message());
        Ok(())
    }
}
