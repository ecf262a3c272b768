use crate::auth::CurrentUser;
use crate::task::{
    SeaOrmTaskStore, Task, TaskFilter, TaskService, TaskServiceError, TaskState, TaskStatus,
};
use crate::web::api::v1::ServerErrorResponse;
use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Task for API responses. The owner is an internal
/// detail and is never serialized.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Short human-readable title
    title: String,
    /// Free-form description, may be empty
    description: String,
    /// Current status of the task
    status: TaskStatus,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            status: task.status(),
        }
    }
}

/// API response for listing tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    /// Tasks owned by the caller that matched the filter
    tasks: Vec<TaskJson>,
    /// Total number of matching tasks
    count: usize,
}

/// Query parameters for filtering the task list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TasksQuery {
    /// Optional exact status to filter by
    #[serde(default)]
    status: Option<TaskStatus>,
    /// Optional substring to search for in title or description
    #[serde(default)]
    search: Option<String>,
}

/// JSON request payload for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    title: String,
    #[serde(default)]
    description: String,
}

/// JSON request payload for updating a task's status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskStatusRequest {
    status: TaskStatus,
}

fn task_service(state: &TaskState) -> TaskService<SeaOrmTaskStore<'_>> {
    TaskService::new(SeaOrmTaskStore::new(&state.db))
}

fn error_response(
    err: TaskServiceError,
    context: &str,
) -> (StatusCode, Json<ServerErrorResponse>) {
    match err {
        TaskServiceError::TaskNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ServerErrorResponse::new("Task not found".to_string())),
        ),
        TaskServiceError::Storage(err) => {
            tracing::error!("{}: {}", context, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ServerErrorResponse::new(context.to_string())),
            )
        }
    }
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks in JSON format.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(
        ("status" = Option<TaskStatus>, Query, description = "Optional exact status to filter by"),
        ("search" = Option<String>, Query, description = "Optional substring to search for in title or description")
    ),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksResponse>, (StatusCode, Json<ServerErrorResponse>)> {
    let filter = TaskFilter {
        status: query.status,
        search: query.search,
    };

    match task_service(&state).list_tasks(&filter, &current_user).await {
        Ok(tasks) => {
            let tasks: Vec<TaskJson> = tasks.into_iter().map(TaskJson::from).collect();
            let count = tasks.len();

            Ok(Json(TasksResponse { tasks, count }))
        }
        Err(err) => Err(error_response(err, "Failed to retrieve tasks")),
    }
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single owned task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Successfully retrieved task", body = TaskJson),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<TaskJson>, (StatusCode, Json<ServerErrorResponse>)> {
    task_service(&state)
        .get_task(id, &current_user)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| error_response(err, "Failed to retrieve task"))
}

/// Handler for POST /api/v1/tasks - Creates a task owned by the caller.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Empty title", body = ServerErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskJson>), (StatusCode, Json<ServerErrorResponse>)> {
    if payload.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ServerErrorResponse::new("Title must not be empty".to_string())),
        ));
    }

    match task_service(&state)
        .create_task(payload.title, payload.description, &current_user)
        .await
    {
        Ok(task) => Ok((StatusCode::CREATED, Json(TaskJson::from(task)))),
        Err(err) => Err(error_response(err, "Failed to create task")),
    }
}

/// Handler for PATCH /api/v1/tasks/{id}/status - Updates an owned task's
/// status. Any status may move to any other status directly.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}/status",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskStatusRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_status_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> Result<Json<TaskJson>, (StatusCode, Json<ServerErrorResponse>)> {
    task_service(&state)
        .update_status(id, payload.status, &current_user)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| error_response(err, "Failed to update task"))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes an owned task and returns
/// its last known state.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = TaskJson),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Task not found", body = ServerErrorResponse),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<TaskJson>, (StatusCode, Json<ServerErrorResponse>)> {
    task_service(&state)
        .delete_task(id, &current_user)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| error_response(err, "Failed to delete task"))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler).delete(delete_task_handler),
        )
        .route("/tasks/{id}/status", patch(update_task_status_handler))
        .with_state(state)
}
