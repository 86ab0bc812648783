/// Task management endpoints
///
/// This module provides the task lifecycle surface:
/// - Creation by admin-rank users, allocating a unique `TASK-NNNNN` id
/// - Paginated listing and per-assignee listing
/// - Full edits (approved admin rank) and status-only updates
/// - Deletion by admin-rank users
///
/// Task creation carries no approval gate; the full edit does. Status-only
/// updates are open to any authenticated user, which lets assignees move
/// their own tasks through the workflow.
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create task (admin rank)
/// - `GET /v1/tasks` - List tasks (paginated)
/// - `GET /v1/tasks/:id` - Get a single task
/// - `PUT /v1/tasks/:id` - Full edit (approved admin rank)
/// - `PATCH /v1/tasks/:id/status` - Status update (any user)
/// - `DELETE /v1/tasks/:id` - Delete task (admin rank)
/// - `GET /v1/users/:id/tasks` - Tasks assigned to a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{load_actor, require_admin_rank, require_approved_for_task_edit},
        middleware::AuthContext,
    },
    models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Default page size for task listings
const DEFAULT_TASK_PAGE_SIZE: i64 = 10;

/// Maximum page size for task listings
const MAX_TASK_PAGE_SIZE: i64 = 100;

/// Task creation request
///
/// Status is not an input: every task starts at `pending`. The acting user
/// becomes `assigned_by`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Longer description of the work
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// User the task is assigned to
    pub assigned_to: Uuid,

    /// Due date (string-encoded calendar date, e.g. "2026-09-15")
    #[validate(length(min = 1, max = 32, message = "Due date must be 1-32 characters"))]
    pub due_date: String,

    /// Priority level
    pub priority: TaskPriority,
}

/// Full-field task update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Longer description of the work
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// User the task is assigned to
    pub assigned_to: Uuid,

    /// Due date (string-encoded calendar date)
    #[validate(length(min = 1, max = 32, message = "Due date must be 1-32 characters"))]
    pub due_date: String,

    /// Priority level
    pub priority: TaskPriority,

    /// Workflow status
    pub status: TaskStatus,
}

/// Status-only update request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    /// New workflow status
    pub status: TaskStatus,
}

/// Query parameters for task listing
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Page size (default 10, max 100)
    pub limit: Option<i64>,

    /// Last-seen task id from the previous page
    pub cursor: Option<Uuid>,
}

/// Paginated task listing response
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Tasks in this page
    pub tasks: Vec<Task>,

    /// Cursor for the next page; absent when this page is the last
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

/// Creates a new task
///
/// Admin rank is required but the acting admin's approval state is not
/// checked on creation; only the full edit carries the approval gate. A
/// unique `TASK-NNNNN` identifier is allocated by retrying the insert on
/// collision.
///
/// # Errors
///
/// - `403 Forbidden`: Actor lacks admin rank
/// - `422 Unprocessable Entity`: Validation failed
/// - `503 Service Unavailable`: Task-id allocation kept colliding
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let actor = load_actor(&state.db, auth.user_id).await?;
    require_admin_rank(&actor)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            assigned_by: actor.id,
            due_date: req.due_date,
            priority: req.priority,
        },
    )
    .await?;

    tracing::info!(
        actor_id = %actor.id,
        task_id = %task.task_id,
        assigned_to = %task.assigned_to,
        "Task created"
    );

    Ok(Json(task))
}

/// Lists tasks with keyset pagination
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TASK_PAGE_SIZE)
        .clamp(1, MAX_TASK_PAGE_SIZE);

    let tasks = Task::list(&state.db, limit, query.cursor).await?;

    // A full page means there may be more; the last id becomes the cursor
    let next_cursor = if tasks.len() as i64 == limit {
        tasks.last().map(|t| t.id)
    } else {
        None
    };

    Ok(Json(ListTasksResponse { tasks, next_cursor }))
}

/// Returns a single task by row id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Full-field replace of a task's editable fields
///
/// Requires admin rank, and an admin actor must be approved. `task_id` and
/// `assigned_by` are immutable.
///
/// # Errors
///
/// - `403 Forbidden`: Actor lacks admin rank, or is an unapproved admin
/// - `404 Not Found`: Task does not exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let actor = load_actor(&state.db, auth.user_id).await?;
    require_approved_for_task_edit(&actor)?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Updates only the task's status
///
/// Open to any authenticated user: assignees move their own tasks through
/// the workflow without holding admin rank. Any status may move to any
/// other status.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = Task::set_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task (admin rank)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = load_actor(&state.db, auth.user_id).await?;
    require_admin_rank(&actor)?;

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(actor_id = %actor.id, task_id = %id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all tasks assigned to a user
pub async fn list_user_tasks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_assignee(&state.db, id).await?;

    Ok(Json(tasks))
}
