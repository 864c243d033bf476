//! # Event Routes
//!
//! CRUD over calendar events — deliveries, auction runs, inspection
//! appointments. In-memory-only owned records.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_core::{EventId, UserId};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, EventRecord};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to create a calendar event.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    /// Short description shown on the calendar.
    pub title: String,
    /// Where the event happens.
    #[serde(default)]
    pub location: Option<String>,
    /// User responsible for the event.
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    /// Start time (RFC 3339).
    pub starts_at: DateTime<Utc>,
    /// End time (RFC 3339). Must be after `starts_at`.
    pub ends_at: DateTime<Utc>,
}

impl Validate for CreateEventRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.ends_at <= self.starts_at {
            return Err("ends_at must be after starts_at".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/:id", get(get_event).delete(delete_event))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/events — List events in start order.
#[utoipa::path(
    get,
    path = "/api/events",
    responses((status = 200, description = "Event list", body = Vec<EventRecord>)),
    tag = "events"
)]
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<EventRecord>> {
    let mut events = state.events.list();
    events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
    Json(events)
}

/// POST /api/events — Create an event.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventRecord),
        (status = 422, description = "Validation error"),
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<EventRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let assignee_id = match req.assignee_id {
        Some(id) if !state.users.contains(&id) => {
            return Err(AppError::Validation(format!(
                "assignee {id} is not a known user"
            )))
        }
        Some(id) => Some(UserId::from_uuid(id)),
        None => None,
    };

    let event = EventRecord {
        id: EventId::new(),
        title: req.title,
        location: req.location,
        assignee_id,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        created_at: Utc::now(),
    };
    state.events.insert(*event.id.as_uuid(), event.clone());

    Ok((axum::http::StatusCode::CREATED, Json(event)))
}

/// GET /api/events/:id — One event.
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Event detail", body = EventRecord),
        (status = 404, description = "Event not found"),
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventRecord>, AppError> {
    state
        .events
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))
}

/// DELETE /api/events/:id — Delete an event.
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found"),
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    state
        .events
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
