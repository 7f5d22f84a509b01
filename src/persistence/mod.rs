use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, PersistenceResult};
use crate::graph::DependencyDag;
use crate::member::{CompositeGroup, GroupMember, MemberId};
use crate::resource::{Resource, ResourceId};
use crate::revision::RevisionPlan;
use crate::session::{Session, SessionId};
use crate::task::{StudyTask, TaskId};
use crate::validation::{validate_session_collection, validate_task_collection};

/// Next id each counter will hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub next_task_id: TaskId,
    pub next_session_id: SessionId,
    pub next_resource_id: ResourceId,
    pub next_member_id: MemberId,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_task_id: 1,
            next_session_id: 1,
            next_resource_id: 1,
            next_member_id: 1,
        }
    }
}

/// Whole planner state as written by the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    #[serde(default)]
    pub counters: IdCounters,
    pub group: CompositeGroup,
    #[serde(default)]
    pub tasks: Vec<StudyTask>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub revision_plans: Vec<RevisionPlan>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl PlannerSnapshot {
    /// Counters raised so none of them can hand out an id already stored.
    pub fn effective_counters(&self) -> IdCounters {
        fn next_after(current: u32, ids: impl Iterator<Item = u32>) -> u32 {
            ids.map(|id| id.saturating_add(1)).fold(current.max(1), u32::max)
        }
        IdCounters {
            next_task_id: next_after(self.counters.next_task_id, self.tasks.iter().map(|t| t.id)),
            next_session_id: next_after(
                self.counters.next_session_id,
                self.sessions.iter().map(|s| s.id),
            ),
            next_resource_id: next_after(
                self.counters.next_resource_id,
                self.resources.iter().map(|r| r.id),
            ),
            next_member_id: next_after(
                self.counters.next_member_id,
                self.members.iter().map(|m| m.id),
            ),
        }
    }
}

pub trait PlannerStore {
    fn save_planner(&self, snapshot: &PlannerSnapshot) -> PersistenceResult<()>;
    fn load_planner(&self) -> PersistenceResult<Option<PlannerSnapshot>>;
}

fn unique_ids<I>(kind: &str, ids: I) -> PersistenceResult<HashSet<u32>>
where
    I: IntoIterator<Item = u32>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate {kind} id {id}"
            )));
        }
    }
    Ok(seen)
}

/// Checks a snapshot before any of it is applied: entity rules, id
/// uniqueness, cross references, acyclic prerequisites, one plan per task.
pub fn validate_snapshot(snapshot: &PlannerSnapshot) -> PersistenceResult<()> {
    validate_task_collection(&snapshot.tasks)
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
    validate_session_collection(&snapshot.sessions)
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    let task_ids: HashSet<TaskId> = snapshot.tasks.iter().map(|t| t.id).collect();
    let member_ids = unique_ids("member", snapshot.members.iter().map(|m| m.id))?;
    let resource_ids = unique_ids("resource", snapshot.resources.iter().map(|r| r.id))?;

    for member in &snapshot.members {
        if let Some((metric, score)) = member.performance.iter().find(|(_, s)| !s.is_finite()) {
            return Err(PersistenceError::InvalidData(format!(
                "member {} has non-finite score {score} for '{metric}'",
                member.id
            )));
        }
    }

    if !DependencyDag::build(&snapshot.tasks).is_acyclic() {
        return Err(PersistenceError::InvalidData(
            "task dependencies contain a cycle".into(),
        ));
    }

    for task in &snapshot.tasks {
        if let Some(member) = task.assigned_to {
            if !member_ids.contains(&member) {
                return Err(PersistenceError::InvalidData(format!(
                    "task {} is assigned to unknown member {member}",
                    task.id
                )));
            }
        }
    }

    for session in &snapshot.sessions {
        if !task_ids.contains(&session.task_id) {
            return Err(PersistenceError::InvalidData(format!(
                "session {} references unknown task {}",
                session.id, session.task_id
            )));
        }
        if let Some(resource) = session.resources.iter().find(|r| !resource_ids.contains(*r)) {
            return Err(PersistenceError::InvalidData(format!(
                "session {} books unknown resource {resource}",
                session.id
            )));
        }
        if let Some(member) = session.members.iter().find(|m| !member_ids.contains(*m)) {
            return Err(PersistenceError::InvalidData(format!(
                "session {} includes unknown member {member}",
                session.id
            )));
        }
    }

    let planned = unique_ids(
        "revision plan task",
        snapshot.revision_plans.iter().map(|p| p.task_id),
    )?;
    if let Some(orphan) = planned.iter().find(|id| !task_ids.contains(*id)) {
        return Err(PersistenceError::InvalidData(format!(
            "revision plan for unknown task {orphan}"
        )));
    }
    if let Some(task) = snapshot.tasks.iter().find(|t| !planned.contains(&t.id)) {
        return Err(PersistenceError::InvalidData(format!(
            "task {} has no revision plan",
            task.id
        )));
    }

    if let Some(member) = snapshot
        .group
        .all_members()
        .into_iter()
        .find(|m| !member_ids.contains(m))
    {
        return Err(PersistenceError::InvalidData(format!(
            "group '{}' lists unknown member {member}",
            snapshot.group.name
        )));
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod file;

pub use file::{JsonFileStore, load_snapshot_from_json, save_snapshot_to_json};
