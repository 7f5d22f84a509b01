//! The planner store: owns every collection, validates admissions, assigns
//! ids and fans events out to listeners.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use crate::analytics::{self, ProductivityHeatmap, ProgressReport, Recommendation};
use crate::config::PlannerConfig;
use crate::conflict::{Conflict, ConflictDetector};
use crate::error::{PersistenceResult, PlannerError, ValidationError};
use crate::events::{DeliveryFailure, PlannerEvent, PlannerListener};
use crate::export::{self, ExportFormat};
use crate::graph::DependencyDag;
use crate::member::{CompositeGroup, GroupMember, MemberId, NewMember};
use crate::persistence::{
    self, IdCounters, JsonFileStore, PlannerSnapshot, PlannerStore,
};
use crate::resource::{NewResource, Resource, ResourceId};
use crate::revision::{RevisionAlgorithm, RevisionPlan};
use crate::session::{NewSession, Session, SessionId, SessionStatus};
use crate::task::{NewTask, StudyTask, TaskId, TaskStatus};
use crate::validation::Validate;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Default)]
pub struct PlannerBuilder {
    config: PlannerConfig,
    listeners: Vec<Box<dyn PlannerListener>>,
    algorithm: Option<Box<dyn RevisionAlgorithm>>,
}

impl PlannerBuilder {
    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn listener(mut self, listener: impl PlannerListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Overrides the algorithm selected by the configuration.
    pub fn algorithm(mut self, algorithm: Box<dyn RevisionAlgorithm>) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn build(self) -> Planner {
        let algorithm = self
            .algorithm
            .unwrap_or_else(|| self.config.revision_strategy.algorithm());
        Planner {
            group: CompositeGroup::new(self.config.group_name.clone()),
            config: self.config,
            algorithm,
            listeners: self.listeners,
            delivery_failures: Vec::new(),
            counters: IdCounters::default(),
            tasks: Vec::new(),
            sessions: Vec::new(),
            revision_plans: Vec::new(),
            members: Vec::new(),
            resources: Vec::new(),
        }
    }
}

pub struct Planner {
    config: PlannerConfig,
    algorithm: Box<dyn RevisionAlgorithm>,
    listeners: Vec<Box<dyn PlannerListener>>,
    delivery_failures: Vec<DeliveryFailure>,
    counters: IdCounters,
    tasks: Vec<StudyTask>,
    sessions: Vec<Session>,
    revision_plans: Vec<RevisionPlan>,
    members: Vec<GroupMember>,
    resources: Vec<Resource>,
    group: CompositeGroup,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    pub fn new() -> Self {
        PlannerBuilder::default().build()
    }

    pub fn builder() -> PlannerBuilder {
        PlannerBuilder::default()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    pub fn add_listener(&mut self, listener: impl PlannerListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn delivery_failures(&self) -> &[DeliveryFailure] {
        &self.delivery_failures
    }

    fn notify(&mut self, event: PlannerEvent) {
        for listener in self.listeners.iter_mut() {
            if let Err(error) = listener.on_event(&event) {
                warn!(
                    "listener '{}' failed on \"{}\": {error}",
                    listener.name(),
                    event
                );
                self.delivery_failures.push(DeliveryFailure {
                    listener: listener.name().to_string(),
                    event: event.clone(),
                    error,
                });
            }
        }
    }

    // ---- admissions ----

    pub fn add_task(&mut self, draft: NewTask) -> Result<TaskId, PlannerError> {
        if let Err(err) = draft.validate() {
            warn!("rejected task '{}': {err}", draft.title);
            return Err(err.into());
        }
        if let Some(member) = draft.assigned_to {
            self.member_index(member)?;
        }

        let id = self.counters.next_task_id;
        self.counters.next_task_id += 1;
        let task = draft.into_task(id);
        self.revision_plans
            .push(RevisionPlan::new(id, task.created_date));
        let title = task.title.clone();
        self.tasks.push(task);

        info!("task {id} added: {title}");
        self.notify(PlannerEvent::TaskAdded { id, title });
        Ok(id)
    }

    pub fn add_session(&mut self, draft: NewSession) -> Result<SessionId, PlannerError> {
        if let Err(err) = draft.validate() {
            warn!("rejected session for task {}: {err}", draft.task_id);
            return Err(err.into());
        }
        self.task_index(draft.task_id)?;
        for &resource in &draft.resources {
            self.resource_index(resource)?;
        }
        for &member in &draft.members {
            self.member_index(member)?;
        }

        let id = self.counters.next_session_id;
        self.counters.next_session_id += 1;
        let session = draft.into_session(id);
        let task_id = session.task_id;
        self.sessions.push(session);

        info!("session {id} added for task {task_id}");
        self.notify(PlannerEvent::SessionAdded { id, task_id });
        Ok(id)
    }

    pub fn add_member(&mut self, draft: NewMember) -> MemberId {
        let id = self.counters.next_member_id;
        self.counters.next_member_id += 1;
        let member = draft.into_member(id);
        let name = member.name.clone();
        self.members.push(member);
        self.group.add_member(id);

        info!("member {id} added: {name}");
        self.notify(PlannerEvent::MemberAdded { id, name });
        id
    }

    pub fn add_resource(&mut self, draft: NewResource) -> ResourceId {
        let id = self.counters.next_resource_id;
        self.counters.next_resource_id += 1;
        let resource = draft.into_resource(id);
        let name = resource.name.clone();
        self.resources.push(resource);

        info!("resource {id} added: {name}");
        self.notify(PlannerEvent::ResourceAdded { id, name });
        id
    }

    // ---- revisions ----

    pub fn todays_revisions(&self) -> Vec<StudyTask> {
        self.due_revisions_on(today())
    }

    pub fn due_revisions_on(&self, date: NaiveDate) -> Vec<StudyTask> {
        let due = analytics::due_revisions(&self.tasks, &self.revision_plans, date);
        debug!("{} revisions due on {date}", due.len());
        due
    }

    pub fn mark_revision_complete(&mut self, task_id: TaskId) -> Option<RevisionPlan> {
        self.mark_revision_complete_on(task_id, today())
    }

    /// No-op returning `None` when the task has no plan.
    pub fn mark_revision_complete_on(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
    ) -> Option<RevisionPlan> {
        let plan = self
            .revision_plans
            .iter_mut()
            .find(|p| p.task_id == task_id)?;
        plan.mark_revised(self.algorithm.as_ref(), date);
        let updated = plan.clone();

        info!(
            "revision of task {task_id} completed; stage {} due {}",
            updated.stage, updated.next_due
        );
        self.notify(PlannerEvent::RevisionCompleted { task_id });
        Some(updated)
    }

    /// Applies to later completions only; existing due dates are kept.
    pub fn set_revision_algorithm(&mut self, algorithm: Box<dyn RevisionAlgorithm>) {
        let name = algorithm.name().to_string();
        self.algorithm = algorithm;
        info!("revision algorithm set to {name}");
        self.notify(PlannerEvent::AlgorithmChanged { name });
    }

    pub fn revision_plan(&self, task_id: TaskId) -> Option<RevisionPlan> {
        self.revision_plans
            .iter()
            .find(|p| p.task_id == task_id)
            .cloned()
    }

    // ---- read-side delegations ----

    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let conflicts = ConflictDetector::new(&self.sessions, &self.resources).detect();
        debug!("{} conflicts detected", conflicts.len());
        conflicts
    }

    /// Placeholder hook: records the attempt and changes nothing.
    pub fn resolve_conflict(&mut self, conflict: &Conflict) -> bool {
        let conflict_id = conflict.id();
        info!("attempting to resolve conflict {conflict_id}");
        self.notify(PlannerEvent::ConflictResolutionAttempted { conflict_id });
        true
    }

    pub fn progress_report(&self) -> ProgressReport {
        analytics::progress_report(&self.tasks, &self.sessions)
    }

    pub fn productivity_heatmap(&self) -> ProductivityHeatmap {
        self.productivity_heatmap_on(today())
    }

    pub fn productivity_heatmap_on(&self, date: NaiveDate) -> ProductivityHeatmap {
        analytics::productivity_heatmap(
            &self.sessions,
            date,
            self.config.heatmap_days,
            self.config.heatmap_bar_width,
        )
    }

    pub fn status_breakdown(&self) -> BTreeMap<TaskStatus, usize> {
        analytics::status_breakdown(&self.tasks)
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        analytics::recommendations(&self.tasks)
    }

    pub fn overdue_assignments(&self) -> Vec<StudyTask> {
        self.overdue_assignments_on(today())
    }

    pub fn overdue_assignments_on(&self, date: NaiveDate) -> Vec<StudyTask> {
        analytics::overdue_assignments(&self.tasks, date)
    }

    pub fn search_tasks(&self, query: &str) -> Vec<StudyTask> {
        analytics::search_tasks(&self.tasks, query)
    }

    // ---- accessors ----

    pub fn tasks(&self) -> Vec<StudyTask> {
        self.tasks.clone()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    pub fn members(&self) -> Vec<GroupMember> {
        self.members.clone()
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.resources.clone()
    }

    pub fn revision_plans(&self) -> Vec<RevisionPlan> {
        self.revision_plans.clone()
    }

    pub fn main_group(&self) -> CompositeGroup {
        self.group.clone()
    }

    pub fn find_task(&self, id: TaskId) -> Option<StudyTask> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn find_session(&self, id: SessionId) -> Option<Session> {
        self.sessions.iter().find(|s| s.id == id).cloned()
    }

    pub fn find_member(&self, id: MemberId) -> Option<GroupMember> {
        self.members.iter().find(|m| m.id == id).cloned()
    }

    pub fn find_resource(&self, id: ResourceId) -> Option<Resource> {
        self.resources.iter().find(|r| r.id == id).cloned()
    }

    pub fn tasks_assigned_to(&self, member: MemberId) -> Vec<StudyTask> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_to == Some(member))
            .cloned()
            .collect()
    }

    pub fn sessions_for_resource(&self, resource: ResourceId) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|s| s.resources.contains(&resource))
            .cloned()
            .collect()
    }

    pub fn sessions_for_task(&self, task: TaskId) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|s| s.task_id == task)
            .cloned()
            .collect()
    }

    /// Flag set and no booked session overlapping `[start, end)`.
    pub fn is_resource_available(
        &self,
        resource: ResourceId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> bool {
        let Some(found) = self.resources.iter().find(|r| r.id == resource) else {
            return false;
        };
        found.available
            && !self
                .sessions
                .iter()
                .filter(|s| s.resources.contains(&resource))
                .any(|s| s.overlaps_interval(start, end))
    }

    /// Prerequisites before dependents, ties by id.
    pub fn study_order(&self) -> Vec<TaskId> {
        DependencyDag::build(&self.tasks)
            .study_order()
            .unwrap_or_default()
    }

    // ---- relationship mutations ----

    fn task_index(&self, id: TaskId) -> Result<usize, PlannerError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlannerError::not_found("task", id))
    }

    fn session_index(&self, id: SessionId) -> Result<usize, PlannerError> {
        self.sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| PlannerError::not_found("session", id))
    }

    fn member_index(&self, id: MemberId) -> Result<usize, PlannerError> {
        self.members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| PlannerError::not_found("member", id))
    }

    fn resource_index(&self, id: ResourceId) -> Result<usize, PlannerError> {
        self.resources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| PlannerError::not_found("resource", id))
    }

    /// Makes `task` depend on `prerequisite`. Self references and edges that
    /// would close a cycle are refused without touching any dependency set.
    pub fn add_dependency(
        &mut self,
        task: TaskId,
        prerequisite: TaskId,
    ) -> Result<(), PlannerError> {
        let idx = self.task_index(task)?;
        self.task_index(prerequisite)?;

        if DependencyDag::build(&self.tasks).would_create_cycle(task, prerequisite) {
            warn!("refused dependency {task} -> {prerequisite}: cycle");
            return Err(PlannerError::CyclicDependency { task, prerequisite });
        }

        if self.tasks[idx].dependencies.insert(prerequisite) {
            info!("task {task} now depends on {prerequisite}");
            self.notify(PlannerEvent::DependencyAdded { task, prerequisite });
        }
        Ok(())
    }

    pub fn assign_task(&mut self, task: TaskId, member: MemberId) -> Result<(), PlannerError> {
        let idx = self.task_index(task)?;
        self.member_index(member)?;
        self.tasks[idx].assigned_to = Some(member);
        Ok(())
    }

    pub fn set_task_status(&mut self, task: TaskId, status: TaskStatus) -> Result<(), PlannerError> {
        let idx = self.task_index(task)?;
        self.tasks[idx].status = status;
        Ok(())
    }

    pub fn add_tag(&mut self, task: TaskId, tag: impl Into<String>) -> Result<(), PlannerError> {
        let idx = self.task_index(task)?;
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() {
            self.tasks[idx].tags.insert(tag.to_string());
        }
        Ok(())
    }

    pub fn book_resource(
        &mut self,
        session: SessionId,
        resource: ResourceId,
    ) -> Result<(), PlannerError> {
        let idx = self.session_index(session)?;
        self.resource_index(resource)?;
        self.sessions[idx].resources.insert(resource);
        Ok(())
    }

    pub fn assign_member_to_session(
        &mut self,
        session: SessionId,
        member: MemberId,
    ) -> Result<(), PlannerError> {
        let idx = self.session_index(session)?;
        self.member_index(member)?;
        self.sessions[idx].members.insert(member);
        Ok(())
    }

    pub fn set_session_status(
        &mut self,
        session: SessionId,
        status: SessionStatus,
    ) -> Result<(), PlannerError> {
        let idx = self.session_index(session)?;
        self.sessions[idx].status = status;
        Ok(())
    }

    pub fn set_resource_available(
        &mut self,
        resource: ResourceId,
        available: bool,
    ) -> Result<(), PlannerError> {
        let idx = self.resource_index(resource)?;
        self.resources[idx].available = available;
        Ok(())
    }

    /// Scores must be finite so the member survives a save and load.
    pub fn record_performance(
        &mut self,
        member: MemberId,
        metric: impl Into<String>,
        score: f64,
    ) -> Result<(), PlannerError> {
        let idx = self.member_index(member)?;
        let metric = metric.into();
        if !score.is_finite() {
            warn!("rejected score {score} for member {member} on '{metric}'");
            return Err(ValidationError::new(
                "performance score",
                vec![format!("score for '{metric}' must be finite (got {score})")],
            )
            .into());
        }
        self.members[idx].record_performance(metric, score);
        Ok(())
    }

    /// Every member of the sub-group tree must already be known.
    pub fn add_sub_group(&mut self, group: CompositeGroup) -> Result<(), PlannerError> {
        for member in group.all_members() {
            self.member_index(member)?;
        }
        self.group.add_sub_group(group);
        Ok(())
    }

    pub fn set_group_leader(&mut self, member: MemberId) -> Result<(), PlannerError> {
        self.member_index(member)?;
        self.group.set_leader(member);
        Ok(())
    }

    // ---- snapshots, persistence, export ----

    pub fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot {
            counters: self.counters,
            group: self.group.clone(),
            tasks: self.tasks.clone(),
            sessions: self.sessions.clone(),
            revision_plans: self.revision_plans.clone(),
            members: self.members.clone(),
            resources: self.resources.clone(),
        }
    }

    /// Replaces the whole state. The snapshot is validated first; on error the
    /// planner is left exactly as it was.
    pub fn restore(&mut self, snapshot: PlannerSnapshot) -> Result<(), PlannerError> {
        persistence::validate_snapshot(&snapshot)?;
        let restored = snapshot.effective_counters();
        // Never rewind: ids handed out before the restore stay unused.
        self.counters = IdCounters {
            next_task_id: restored.next_task_id.max(self.counters.next_task_id),
            next_session_id: restored.next_session_id.max(self.counters.next_session_id),
            next_resource_id: restored.next_resource_id.max(self.counters.next_resource_id),
            next_member_id: restored.next_member_id.max(self.counters.next_member_id),
        };
        self.group = snapshot.group;
        self.tasks = snapshot.tasks;
        self.sessions = snapshot.sessions;
        self.revision_plans = snapshot.revision_plans;
        self.members = snapshot.members;
        self.resources = snapshot.resources;

        info!(
            "planner restored: {} tasks, {} sessions",
            self.tasks.len(),
            self.sessions.len()
        );
        self.notify(PlannerEvent::StateRestored);
        Ok(())
    }

    pub fn save_with(&self, store: &dyn PlannerStore) -> Result<(), PlannerError> {
        store.save_planner(&self.snapshot())?;
        Ok(())
    }

    /// Returns `false` when the store holds nothing.
    pub fn load_with(&mut self, store: &dyn PlannerStore) -> Result<bool, PlannerError> {
        match store.load_planner()? {
            Some(snapshot) => {
                self.restore(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), PlannerError> {
        self.save_with(&JsonFileStore::new(path.as_ref()))
    }

    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<(), PlannerError> {
        let snapshot = persistence::load_snapshot_from_json(path)?;
        self.restore(snapshot)
    }

    pub fn export_tasks(&self, format: ExportFormat) -> PersistenceResult<String> {
        export::export_tasks(&self.tasks, format)
    }

    pub fn write_export(
        &self,
        format: ExportFormat,
        path: impl AsRef<Path>,
    ) -> PersistenceResult<()> {
        let document = self.export_tasks(format)?;
        fs::write(path, document)?;
        Ok(())
    }
}
