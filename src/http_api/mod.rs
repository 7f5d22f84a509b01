use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Conflict, ExportFormat, GroupMember, NewMember, NewResource, NewSession, NewTask, Planner,
    PlannerError, ProductivityHeatmap, ProgressReport, Recommendation, Resource, RevisionPlan,
    RevisionStrategy, Session, SessionStatus, StudyTask, TaskId, TaskStatus,
};

#[derive(Clone)]
pub struct AppState {
    planner: Arc<RwLock<Planner>>,
}

impl AppState {
    pub fn new(planner: Planner) -> Self {
        Self {
            planner: Arc::new(RwLock::new(planner)),
        }
    }

    pub fn with_shared(planner: Arc<RwLock<Planner>>) -> Self {
        Self { planner }
    }

    fn planner(&self) -> Arc<RwLock<Planner>> {
        self.planner.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlannerError> for ApiError {
    fn from(value: PlannerError) -> Self {
        match value {
            PlannerError::Validation(err) => ApiError::Invalid(err.to_string()),
            PlannerError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            PlannerError::CyclicDependency { .. } => ApiError::Conflict(value.to_string()),
            PlannerError::Persistence(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
}

#[derive(Debug, Deserialize)]
struct DependencyPayload {
    prerequisite: TaskId,
}

#[derive(Debug, Deserialize)]
struct AlgorithmPayload {
    algorithm: String,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ConflictView {
    id: String,
    message: String,
    #[serde(flatten)]
    conflict: Conflict,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/status", put(update_task_status))
        .route("/tasks/:id/dependencies", post(add_dependency))
        .route("/tasks/:id/revision", post(complete_revision))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/:id/status", put(update_session_status))
        .route("/members", get(list_members).post(create_member))
        .route("/resources", get(list_resources).post(create_resource))
        .route("/revisions/due", get(due_revisions))
        .route("/conflicts", get(list_conflicts))
        .route("/analytics/progress", get(progress))
        .route("/analytics/heatmap", get(heatmap))
        .route("/analytics/recommendations", get(recommendations))
        .route("/export/:format", get(export_tasks))
        .route("/settings/algorithm", put(set_algorithm))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, planner: Planner) -> std::io::Result<()> {
    let state = AppState::new(planner);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<StudyTask>> {
    Json(state.planner().read().tasks())
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<StudyTask>, ApiError> {
    state
        .planner()
        .read()
        .find_task(task_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("task {task_id} not found")))
}

async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<NewTask>,
) -> Result<(StatusCode, Json<StudyTask>), ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let id = guard.add_task(draft)?;
    let created = guard
        .find_task(id)
        .ok_or_else(|| ApiError::Internal("task not found after creation".into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<StudyTask>, ApiError> {
    let status: TaskStatus = payload.status.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let mut guard = planner.write();
    guard.set_task_status(task_id, status)?;
    guard
        .find_task(task_id)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("task not found after update".into()))
}

async fn add_dependency(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
    Json(payload): Json<DependencyPayload>,
) -> Result<Json<StudyTask>, ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    guard.add_dependency(task_id, payload.prerequisite)?;
    guard
        .find_task(task_id)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("task not found after update".into()))
}

async fn complete_revision(
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
    Query(query): Query<DateQuery>,
) -> Result<Json<RevisionPlan>, ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let plan = match query.date {
        Some(date) => guard.mark_revision_complete_on(task_id, date),
        None => guard.mark_revision_complete(task_id),
    };
    plan.map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no revision plan for task {task_id}")))
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.planner().read().sessions())
}

async fn create_session(
    State(state): State<AppState>,
    Json(draft): Json<NewSession>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let id = guard.add_session(draft)?;
    let created = guard
        .find_session(id)
        .ok_or_else(|| ApiError::Internal("session not found after creation".into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<u32>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Session>, ApiError> {
    let status: SessionStatus = payload.status.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let mut guard = planner.write();
    guard.set_session_status(session_id, status)?;
    guard
        .find_session(session_id)
        .map(Json)
        .ok_or_else(|| ApiError::Internal("session not found after update".into()))
}

async fn list_members(State(state): State<AppState>) -> Json<Vec<GroupMember>> {
    Json(state.planner().read().members())
}

async fn create_member(
    State(state): State<AppState>,
    Json(draft): Json<NewMember>,
) -> Result<(StatusCode, Json<GroupMember>), ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let id = guard.add_member(draft);
    let created = guard
        .find_member(id)
        .ok_or_else(|| ApiError::Internal("member not found after creation".into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_resources(State(state): State<AppState>) -> Json<Vec<Resource>> {
    Json(state.planner().read().resources())
}

async fn create_resource(
    State(state): State<AppState>,
    Json(draft): Json<NewResource>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let planner = state.planner();
    let mut guard = planner.write();
    let id = guard.add_resource(draft);
    let created = guard
        .find_resource(id)
        .ok_or_else(|| ApiError::Internal("resource not found after creation".into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn due_revisions(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Json<Vec<StudyTask>> {
    let planner = state.planner();
    let guard = planner.read();
    Json(match query.date {
        Some(date) => guard.due_revisions_on(date),
        None => guard.todays_revisions(),
    })
}

async fn list_conflicts(State(state): State<AppState>) -> Json<Vec<ConflictView>> {
    let conflicts = state.planner().read().detect_conflicts();
    Json(
        conflicts
            .into_iter()
            .map(|conflict| ConflictView {
                id: conflict.id(),
                message: conflict.to_string(),
                conflict,
            })
            .collect(),
    )
}

async fn progress(State(state): State<AppState>) -> Json<ProgressReport> {
    Json(state.planner().read().progress_report())
}

async fn heatmap(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Json<ProductivityHeatmap> {
    let planner = state.planner();
    let guard = planner.read();
    Json(match query.date {
        Some(date) => guard.productivity_heatmap_on(date),
        None => guard.productivity_heatmap(),
    })
}

async fn recommendations(State(state): State<AppState>) -> Json<Vec<Recommendation>> {
    Json(state.planner().read().recommendations())
}

async fn export_tasks(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format.parse().map_err(ApiError::invalid)?;
    let document = state
        .planner()
        .read()
        .export_tasks(format)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let content_type = match format {
        ExportFormat::Csv => "text/csv",
        ExportFormat::Json => "application/json",
    };
    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], document).into_response())
}

async fn set_algorithm(
    State(state): State<AppState>,
    Json(payload): Json<AlgorithmPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let strategy: RevisionStrategy = payload.algorithm.parse().map_err(ApiError::invalid)?;
    let planner = state.planner();
    let mut guard = planner.write();
    guard.set_revision_algorithm(strategy.algorithm());
    Ok(Json(json!({ "algorithm": guard.algorithm_name() })))
}
