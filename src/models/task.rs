use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents a task entity as stored in the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: i64,
    /// Identifier of the owning user.
    pub user_id: i64,
    /// The title of the task. Never empty.
    pub title: String,
    /// Free-form description, empty when not provided.
    pub description: String,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a [`Task`]; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: i64,
    pub title: String,
    pub description: String,
}

/// Payload for creating a task.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Must be between 1 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    /// Maximum length of 1000 characters if provided.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

/// Task as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            created_at: task.created_at,
            updated_at: task.updated_at,
            user_id: task.user_id,
        }
    }
}

impl Task {
    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: UpdateTaskRequest) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(is_completed) = update.is_completed {
            self.is_completed = is_completed;
        }
    }
}
