//! # User Administration Routes
//!
//! Admin-only CRUD over user account profiles, with three hard rules:
//!
//! 1. The bootstrap administrator account can never be modified or
//!    deleted through these routes, regardless of caller.
//! 2. No request can set a role to `admin` — there is exactly one admin,
//!    seeded at startup.
//! 3. Free-form status input is normalized to `active`/`inactive` before
//!    storage.
//!
//! Creation is check-then-insert on the normalized email; a duplicate gets
//! 409 and the existing profile is left untouched.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{normalize_email, AppState, UserRecord, UserStatus};

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to create a user account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    /// Email address; normalized to lowercase. Unique.
    pub email: String,
    /// Initial password. Digested before storage, never stored raw.
    pub password: String,
    /// Role: "seller" or "manager". "admin" is refused.
    pub role: String,
    /// Name shown in the UI. Defaults to the email's local part.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Request to edit a user account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    /// New display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// New role: "seller" or "manager". "admin" is refused.
    #[serde(default)]
    pub role: Option<String>,
    /// New status; free-form input normalized to active/inactive.
    #[serde(default)]
    pub status: Option<String>,
}

/// A user profile in API responses. Credentials never appear here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the user administration router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_to_response(user: &UserRecord) -> UserResponse {
    UserResponse {
        id: *user.id.as_uuid(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: user.role.as_str().to_string(),
        status: user.status.as_str().to_string(),
        created_at: user.created_at.to_rfc3339(),
        updated_at: user.updated_at.to_rfc3339(),
    }
}

/// Parse a role for assignment through these routes. `admin` is never
/// assignable, whoever asks.
fn parse_assignable_role(s: &str) -> Result<Role, AppError> {
    match Role::parse(s) {
        Some(Role::Admin) => Err(AppError::Forbidden(
            "role cannot be set to admin through this API".to_string(),
        )),
        Some(role) => Ok(role),
        None => Err(AppError::Validation(format!("unknown role: '{s}'"))),
    }
}

/// Reject any mutation of the bootstrap admin account.
fn guard_protected_admin(state: &AppState, id: Uuid) -> Result<(), AppError> {
    if id == *state.admin_user_id.as_uuid() {
        return Err(AppError::Forbidden(
            "the administrator account cannot be modified or deleted".to_string(),
        ));
    }
    Ok(())
}

async fn persist(state: &AppState, user: &UserRecord) {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::upsert(pool, user).await {
            tracing::error!(error = %e, user_id = %user.id, "failed to persist user");
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users — List user profiles.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "User list", body = Vec<UserResponse>),
        (status = 403, description = "Caller is not admin"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    require_role(&caller, Role::Admin)?;
    let mut users = state.users.list();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(users.iter().map(user_to_response).collect()))
}

/// POST /api/users — Create a user account.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Caller is not admin, or role escalation attempted"),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation error"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<UserResponse>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;

    let role = parse_assignable_role(&req.role)?;
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let email = normalize_email(&req.email).map_err(AppError::from)?;
    // Duplicate email is a recoverable constraint violation: refuse the
    // new account, leave the existing profile exactly as it was.
    if state.users.list().iter().any(|u| u.email == email) {
        return Err(AppError::Conflict(format!(
            "a user with email {email} already exists"
        )));
    }

    let display_name = match req.display_name {
        Some(name) => name,
        None => email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let user = UserRecord::new(&email, display_name, role, &req.password, Utc::now())?;
    state.users.insert(*user.id.as_uuid(), user.clone());
    persist(&state, &user).await;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(user_to_response(&user)),
    ))
}

/// GET /api/users/:id — One user profile.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Caller is not admin"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    let user = state
        .users
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
    Ok(Json(user_to_response(&user)))
}

/// PATCH /api/users/:id — Edit a user account.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User UUID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Protected admin account, or escalation attempted"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    require_role(&caller, Role::Admin)?;
    guard_protected_admin(&state, id)?;
    let req = extract_json(body)?;

    let role = req
        .role
        .as_deref()
        .map(parse_assignable_role)
        .transpose()?;
    let status = req
        .status
        .as_deref()
        .map(|s| {
            UserStatus::normalize(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status: '{s}'")))
        })
        .transpose()?;
    if let Some(name) = &req.display_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "display_name must not be empty".to_string(),
            ));
        }
    }

    let user = state
        .users
        .update(&id, |user| {
            if let Some(name) = req.display_name.clone() {
                user.display_name = name;
            }
            if let Some(role) = role {
                user.role = role;
            }
            if let Some(status) = status {
                user.status = status;
            }
            user.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    persist(&state, &user).await;
    Ok(Json(user_to_response(&user)))
}

/// DELETE /api/users/:id — Delete a user account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Protected admin account"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    guard_protected_admin(&state, id)?;

    state
        .users
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::delete(pool, id).await {
            tracing::error!(error = %e, user_id = %id, "failed to delete persisted user");
        }
    }
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

    fn app_as(state: AppState, role: Role) -> Router<()> {
        router()
            .layer(axum::Extension(CallerIdentity {
                role,
                user_id: None,
            }))
            .with_state(state)
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

    fn patch(uri: String, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn seller_body() -> serde_json::Value {
        serde_json::json!({
            "email": "dana@example.com",
            "password": "a-long-password",
            "role": "seller"
        })
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let state = AppState::new();
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: UserResponse = body_json(response).await;
        assert_eq!(created.email, "dana@example.com");
        assert_eq!(created.role, "seller");
        assert_eq!(created.status, "active");

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/users/{}", created.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: UserResponse = body_json(response).await;
        assert_eq!(fetched.email, created.email);
        assert_eq!(fetched.role, created.role);
        assert_eq!(fetched.status, "active");
    }

    #[tokio::test]
    async fn non_admin_cannot_touch_user_routes() {
        let state = AppState::new();
        for role in [Role::Seller, Role::Manager] {
            let app = app_as(state.clone(), role);
            let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);

            let app = app_as(state.clone(), role);
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/users")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_and_preserves_original() {
        let state = AppState::new();
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        let created: UserResponse = body_json(response).await;

        // Same email, different case and role.
        let app = app_as(state.clone(), Role::Admin);
        let mut dup = seller_body();
        dup["email"] = serde_json::json!("Dana@Example.COM");
        dup["role"] = serde_json::json!("manager");
        let response = app.oneshot(post("/api/users", dup)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let survivor = state.users.get(&created.id).unwrap();
        assert_eq!(survivor.role.as_str(), "seller");
    }

    #[tokio::test]
    async fn role_cannot_be_escalated_to_admin() {
        let state = AppState::new();

        // At creation.
        let app = app_as(state.clone(), Role::Admin);
        let mut body = seller_body();
        body["role"] = serde_json::json!("admin");
        let response = app.oneshot(post("/api/users", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Via PATCH.
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        let created: UserResponse = body_json(response).await;

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(patch(
                format!("/api/users/{}", created.id),
                serde_json::json!({"role": "admin"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(state.users.get(&created.id).unwrap().role, Role::Seller);
    }

    #[tokio::test]
    async fn protected_admin_cannot_be_patched_or_deleted() {
        let state = AppState::new();
        let admin_id = *state.admin_user_id.as_uuid();

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(patch(
                format!("/api/users/{admin_id}"),
                serde_json::json!({"display_name": "Impostor"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/users/{admin_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(state.users.contains(&admin_id));
    }

    #[tokio::test]
    async fn status_input_is_normalized() {
        let state = AppState::new();
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        let created: UserResponse = body_json(response).await;

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(patch(
                format!("/api/users/{}", created.id),
                serde_json::json!({"status": " Disabled "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: UserResponse = body_json(response).await;
        assert_eq!(updated.status, "inactive");
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let state = AppState::new();
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        let created: UserResponse = body_json(response).await;

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(patch(
                format!("/api/users/{}", created.id),
                serde_json::json!({"status": "banished"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let state = AppState::new();
        let app = app_as(state, Role::Admin);
        let mut body = seller_body();
        body["password"] = serde_json::json!("short");
        let response = app.oneshot(post("/api/users", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn delete_removes_regular_user() {
        let state = AppState::new();
        let app = app_as(state.clone(), Role::Admin);
        let response = app.oneshot(post("/api/users", seller_body())).await.unwrap();
        let created: UserResponse = body_json(response).await;

        let app = app_as(state.clone(), Role::Admin);
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/users/{}", created.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!state.users.contains(&created.id));
    }
}
