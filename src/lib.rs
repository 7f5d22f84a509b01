pub mod analytics;
pub mod config;
pub mod conflict;
pub mod error;
pub mod events;
pub mod export;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod member;
pub mod persistence;
pub mod planner;
pub mod resource;
pub mod revision;
pub mod session;
pub mod task;
pub mod validation;

pub use analytics::{HeatmapDay, ProductivityHeatmap, ProgressReport, Recommendation};
pub use config::PlannerConfig;
pub use conflict::{Conflict, ConflictDetector};
pub use error::{ListenerError, PersistenceError, PlannerError, ValidationError};
pub use events::{ActivityLog, DeliveryFailure, LogEntry, PlannerEvent, PlannerListener};
pub use export::{ExportFormat, Exportable, PlanExporter, TaskRecord};
pub use member::{CompositeGroup, GroupMember, MemberId, NewMember};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePlannerStore;
pub use persistence::{IdCounters, JsonFileStore, PlannerSnapshot, PlannerStore};
pub use planner::{Planner, PlannerBuilder};
pub use resource::{NewResource, Resource, ResourceId, ResourceKind, ResourceType};
pub use revision::{
    ExponentialBackoff, GraduatedIntervals, RevisionAlgorithm, RevisionPlan, RevisionStrategy,
};
pub use session::{NewSession, Session, SessionId, SessionKind, SessionStatus};
pub use task::{Difficulty, NewTask, StudyTask, TaskId, TaskKind, TaskStatus};
pub use validation::Validate;
