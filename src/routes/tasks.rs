use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateTaskRequest, NewTask, Task, TaskResponse, UpdateTaskRequest},
    response::success,
    state::AppState,
    store::StoreError,
};
use actix_web::{delete, get, http::StatusCode, post, put, web, Responder};
use serde_json::json;
use validator::Validate;

/// Parses a task id from the path; anything that is not a positive integer is a 400.
fn parse_task_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("Invalid task ID".into()))
}

/// Loads a task and checks that `user_id` owns it.
async fn owned_task(
    state: &AppState,
    user_id: i64,
    task_id: i64,
    action: &str,
) -> Result<Task, AppError> {
    let task = state.tasks.find_by_id(task_id).await.map_err(|e| match e {
        StoreError::NotFound => AppError::NotFound("task not found".into()),
        other => other.into(),
    })?;

    if task.user_id != user_id {
        return Err(AppError::Forbidden(format!(
            "unauthorized to {} this task",
            action
        )));
    }
    Ok(task)
}

/// Retrieves all tasks of the authenticated user, newest first.
///
/// ## Responses:
/// - `200 OK`: envelope with `{"tasks": [...]}`.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks: Vec<TaskResponse> = state
        .tasks
        .list_by_user(user.id)
        .await?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    Ok(success(
        StatusCode::OK,
        "Tasks retrieved successfully",
        json!({ "tasks": tasks }),
    ))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: required, 1-200 characters.
/// - `description` (optional): up to 1000 characters.
///
/// ## Responses:
/// - `201 Created`: envelope with `{"task": {...}}`.
/// - `400 Bad Request`: missing title or malformed body.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let input = task_data.into_inner();

    let task = state
        .tasks
        .create(NewTask {
            user_id: user.id,
            title: input.title,
            description: input.description,
        })
        .await?;

    Ok(success(
        StatusCode::CREATED,
        "Task created successfully",
        json!({ "task": TaskResponse::from(task) }),
    ))
}

/// Retrieves one task. Only its owner may read it.
///
/// ## Responses:
/// - `200 OK`: envelope with `{"task": {...}}`.
/// - `400 Bad Request`: the id is not a positive integer.
/// - `403 Forbidden`: the task belongs to someone else.
/// - `404 Not Found`: no such task.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = owned_task(&state, user.id, task_id, "access").await?;

    Ok(success(
        StatusCode::OK,
        "Task retrieved successfully",
        json!({ "task": TaskResponse::from(task) }),
    ))
}

/// Updates the provided fields of a task. Only its owner may update it.
///
/// ## Request Body:
/// Any of `title`, `description`, `isCompleted`.
///
/// ## Responses:
/// - `200 OK`: envelope with the updated `{"task": {...}}`.
/// - `400 Bad Request`: invalid id, empty title or malformed body.
/// - `403 Forbidden`: the task belongs to someone else.
/// - `404 Not Found`: no such task.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<String>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&task_id)?;
    task_data.validate()?;

    let mut task = owned_task(&state, user.id, task_id, "update").await?;
    task.apply(task_data.into_inner());
    let task = state.tasks.update(&task).await?;

    Ok(success(
        StatusCode::OK,
        "Task updated successfully",
        json!({ "task": TaskResponse::from(task) }),
    ))
}

/// Deletes a task. Only its owner may delete it.
///
/// ## Responses:
/// - `200 OK`: envelope with empty data.
/// - `403 Forbidden`: the task belongs to someone else.
/// - `404 Not Found`: no such task.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_task_id(&task_id)?;
    owned_task(&state, user.id, task_id, "delete").await?;
    state.tasks.delete(task_id).await?;

    Ok(success(
        StatusCode::OK,
        "Task deleted successfully",
        json!({}),
    ))
}
