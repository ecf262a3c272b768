use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::entities::task;
use crate::store::StorageError;

pub mod api;
pub mod store;

pub use crate::entities::task::TaskStatus;
pub use store::{SeaOrmTaskStore, TaskStore};

/// A task as exposed outside the persistence layer. Carries no owner
/// reference; ownership is enforced by the queries that produce it.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: String,
    description: String,
    status: TaskStatus,
}

impl Task {
    pub fn new(id: i32, title: String, description: String, status: TaskStatus) -> Self {
        Self {
            id,
            title,
            description,
            status,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(model.id, model.title, model.description, model.status)
    }
}

/// Owner-scoped listing filter: an exact status match and/or a substring
/// search against title or description. An empty filter matches everything.
#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// No task with this ID is owned by the requesting user. A task owned by
    /// someone else is indistinguishable from a nonexistent one.
    #[error("task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Task state shared with the API layer.
#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<DatabaseConnection>,
}

/// Enforces ownership checks and status transitions on top of a
/// [`TaskStore`].
pub struct TaskService<S> {
    store: S,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns all tasks owned by `owner` that match `filter`. An empty
    /// result is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        owner: &CurrentUser,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let models = self
            .store
            .find_by_filter(filter, owner.id)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Failed to get tasks for user \"{}\", filters: {:?}: {}",
                    owner.username,
                    filter,
                    err
                );
                err
            })?;
        Ok(models.into_iter().map(Task::from).collect())
    }

    /// Retrieves a single task owned by `owner`.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: i32, owner: &CurrentUser) -> Result<Task, TaskServiceError> {
        let model = self.find_owned(id, owner).await?;
        Ok(Task::from(model))
    }

    /// Creates a task owned by `owner`. New tasks always start out open.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        title: String,
        description: String,
        owner: &CurrentUser,
    ) -> Result<Task, TaskServiceError> {
        let model = self
            .store
            .insert(title, description, owner.id)
            .await
            .map_err(|err| {
                tracing::error!("Failed to create a task for user \"{}\": {}", owner.username, err);
                err
            })?;
        Ok(Task::from(model))
    }

    /// Sets the status of an owned task. Any status may move to any other
    /// status directly.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        new_status: TaskStatus,
        owner: &CurrentUser,
    ) -> Result<Task, TaskServiceError> {
        let model = self.find_owned(id, owner).await?;
        let updated = self.store.save_status(model, new_status).await?;
        Ok(Task::from(updated))
    }

    /// Deletes an owned task, returning its last known state.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(
        &self,
        id: i32,
        owner: &CurrentUser,
    ) -> Result<Task, TaskServiceError> {
        let model = self.find_owned(id, owner).await?;
        let deleted = Task::from(model.clone());
        self.store.delete(model).await?;
        Ok(deleted)
    }

    async fn find_owned(
        &self,
        id: i32,
        owner: &CurrentUser,
    ) -> Result<task::Model, TaskServiceError> {
        self.store
            .find_by_id(id, owner.id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}
