//! # Task Routes
//!
//! CRUD over scheduled back-office tasks. Tasks are in-memory-only owned
//! records; any authenticated user can create and edit them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_core::{TaskId, UserId};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AppState, TaskRecord, TaskStatus};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to create a task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    /// Short description shown in lists.
    pub title: String,
    /// Longer free-form detail.
    #[serde(default)]
    pub detail: Option<String>,
    /// User the task is assigned to.
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    /// Due date (YYYY-MM-DD).
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Request to edit a task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New detail.
    #[serde(default)]
    pub detail: Option<String>,
    /// New assignee.
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    /// New due date (YYYY-MM-DD).
    #[serde(default)]
    pub due_date: Option<String>,
    /// New status: "open", "in_progress", or "done".
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the tasks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_due_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("invalid due_date: expected YYYY-MM-DD".to_string()))
}

fn check_assignee(state: &AppState, id: Uuid) -> Result<UserId, AppError> {
    if !state.users.contains(&id) {
        return Err(AppError::Validation(format!(
            "assignee {id} is not a known user"
        )));
    }
    Ok(UserId::from_uuid(id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/tasks — List tasks, most recently created first.
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses((status = 200, description = "Task list", body = Vec<TaskRecord>)),
    tag = "tasks"
)]
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskRecord>> {
    let mut tasks = state.tasks.list();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(tasks)
}

/// POST /api/tasks — Create a task.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskRecord),
        (status = 422, description = "Validation error"),
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<TaskRecord>), AppError> {
    let req = extract_json(body)?;
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    let assignee_id = req
        .assignee_id
        .map(|id| check_assignee(&state, id))
        .transpose()?;
    let due_date = req.due_date.as_deref().map(parse_due_date).transpose()?;

    let now = Utc::now();
    let task = TaskRecord {
        id: TaskId::new(),
        title: req.title,
        detail: req.detail,
        assignee_id,
        due_date,
        status: TaskStatus::Open,
        created_at: now,
        updated_at: now,
    };
    state.tasks.insert(*task.id.as_uuid(), task.clone());

    Ok((axum::http::StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/:id — One task.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task UUID")),
    responses(
        (status = 200, description = "Task detail", body = TaskRecord),
        (status = 404, description = "Task not found"),
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskRecord>, AppError> {
    state
        .tasks
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))
}

/// PATCH /api/tasks/:id — Edit a task.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task UUID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskRecord),
        (status = 404, description = "Task not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskRecord>, AppError> {
    let req = extract_json(body)?;

    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
    }
    let status = req
        .status
        .as_deref()
        .map(|s| {
            TaskStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown task status: '{s}'")))
        })
        .transpose()?;
    let assignee_id = req
        .assignee_id
        .map(|id| check_assignee(&state, id))
        .transpose()?;
    let due_date = req.due_date.as_deref().map(parse_due_date).transpose()?;

    let task = state
        .tasks
        .update(&id, |task| {
            if let Some(title) = req.title.clone() {
                task.title = title;
            }
            if let Some(detail) = req.detail.clone() {
                task.detail = Some(detail);
            }
            if let Some(assignee) = assignee_id {
                task.assignee_id = Some(assignee);
            }
            if let Some(date) = due_date {
                task.due_date = Some(date);
            }
            if let Some(status) = status {
                task.status = status;
            }
            task.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))?;

    Ok(Json(task))
}

/// DELETE /api/tasks/:id — Delete a task.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task UUID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found"),
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    state
        .tasks
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router<()> {
        router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_update_delete_task() {
        let state = AppState::new();
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                "/api/tasks",
                serde_json::json!({"title": "Order dealer plates", "due_date": "2026-08-20"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let task: TaskRecord = body_json(response).await;
        assert_eq!(task.status, TaskStatus::Open);

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/tasks/{}", task.id))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"status": "done"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: TaskRecord = body_json(response).await;
        assert_eq!(updated.status, TaskStatus::Done);

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/tasks/{}", task.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.tasks.is_empty());
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let state = AppState::new();
        let app = test_app(state);
        let response = app
            .oneshot(post("/api/tasks", serde_json::json!({"title": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_assignee_is_rejected() {
        let state = AppState::new();
        let app = test_app(state);
        let response = app
            .oneshot(post(
                "/api/tasks",
                serde_json::json!({
                    "title": "Walk the back row",
                    "assignee_id": Uuid::new_v4()
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn assignee_must_exist_but_admin_works() {
        let state = AppState::new();
        let admin = *state.admin_user_id.as_uuid();
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                "/api/tasks",
                serde_json::json!({"title": "Walk the back row", "assignee_id": admin}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
