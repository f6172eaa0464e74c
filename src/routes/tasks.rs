use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{TaskInput, TaskPatch},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Matched case-insensitively against task titles and status names.
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftQuery {
    pub brief: String,
}

/// Returns every task grouped into the `todo`, `inProgress`, `closed` and `frozen` columns.
///
/// This is the only task route that does not require a bearer token.
#[get("/")]
pub async fn list_tasks(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let board = state.tasks.list().await?;
    Ok(HttpResponse::Ok().json(board))
}

/// Creates a new task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the stored task, including its generated `id`.
/// - `400 Bad Request`: empty title, past due date, or an unknown status/priority.
/// - `401 Unauthorized`: missing or invalid token.
#[post("/")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.create(&user.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Searches tasks by title or status text. Without `title` every task is returned.
#[get("/search")]
pub async fn search_tasks(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.search(query.title.as_deref()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/participants")]
pub async fn participants(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let summary = state.tasks.participants_summary().await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Drafts a description and priority for a task from a short brief.
///
/// ## Responses:
/// - `200 OK`: `{"description": ..., "priority": ...}`.
/// - `500 Internal Server Error`: the model provider failed or answered with unusable content.
#[post("/generate-description")]
pub async fn generate_description(
    state: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<DraftQuery>,
) -> Result<impl Responder, AppError> {
    let draft = state.drafting.draft(&query.brief).await?;
    Ok(HttpResponse::Ok().json(draft))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(&task_id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates only the fields present in the body.
///
/// ## Responses:
/// - `200 OK`: the task as stored after the update.
/// - `400 Bad Request`: malformed id or an empty body.
/// - `404 Not Found`: no task with this id.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<String>,
    task_data: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(&task_id, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    _user: CurrentUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(&task_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
