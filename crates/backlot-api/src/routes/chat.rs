//! # Chat Routes
//!
//! Conversations and messages. Sending a message appends it to the store
//! and publishes it to the in-process broadcast feed; clients that missed
//! the push catch up through the cursor-based poll endpoint
//! (`GET .../messages?after={messageId}`).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_core::{ConversationId, MessageId, UserId};

use crate::auth::CallerIdentity;
use crate::chat::{after_cursor, order_messages};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AppState, ConversationRecord, MessageRecord};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request to create a conversation.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    /// Conversation title.
    pub name: String,
    /// Users in the conversation.
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

/// Request to send a message.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    /// Message text.
    pub body: String,
    /// Explicit sender. Only needed when the bearer token carries no user
    /// binding; a token-bound caller is always the sender.
    #[serde(default)]
    pub sender_id: Option<Uuid>,
}

/// Poll cursor for the message list.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    /// Return only messages after this message id.
    pub after: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/chat/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/chat/conversations/:id/messages",
            get(poll_messages).post(send_message),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/chat/conversations — List conversations.
#[utoipa::path(
    get,
    path = "/api/chat/conversations",
    responses((status = 200, description = "Conversation list", body = Vec<ConversationRecord>)),
    tag = "chat"
)]
pub async fn list_conversations(State(state): State<AppState>) -> Json<Vec<ConversationRecord>> {
    let mut conversations = state.conversations.list();
    conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(conversations)
}

/// POST /api/chat/conversations — Create a conversation.
#[utoipa::path(
    post,
    path = "/api/chat/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationRecord),
        (status = 422, description = "Validation error"),
    ),
    tag = "chat"
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    body: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ConversationRecord>), AppError> {
    let req = extract_json(body)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    for id in &req.participant_ids {
        if !state.users.contains(id) {
            return Err(AppError::Validation(format!(
                "participant {id} is not a known user"
            )));
        }
    }

    let conversation = ConversationRecord {
        id: ConversationId::new(),
        name: req.name,
        participant_ids: req
            .participant_ids
            .into_iter()
            .map(UserId::from_uuid)
            .collect(),
        created_at: Utc::now(),
    };
    state
        .conversations
        .insert(*conversation.id.as_uuid(), conversation.clone());

    Ok((axum::http::StatusCode::CREATED, Json(conversation)))
}

/// GET /api/chat/conversations/:id/messages — Poll messages.
///
/// With `?after={messageId}`, returns only messages strictly newer than
/// the cursor, ordered and de-duplicated; without it, the full ordered
/// history.
#[utoipa::path(
    get,
    path = "/api/chat/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation UUID"),
        ("after" = Option<Uuid>, Query, description = "Cursor message id"),
    ),
    responses(
        (status = 200, description = "Ordered messages", body = Vec<MessageRecord>),
        (status = 404, description = "Conversation not found"),
    ),
    tag = "chat"
)]
pub async fn poll_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PollQuery>,
) -> Result<Json<Vec<MessageRecord>>, AppError> {
    if !state.conversations.contains(&id) {
        return Err(AppError::NotFound(format!("conversation {id} not found")));
    }
    let conversation_id = ConversationId::from_uuid(id);

    let mut messages = state.messages.list();
    messages.retain(|m| m.conversation_id == conversation_id);

    let result = match query.after {
        Some(cursor) => after_cursor(messages, MessageId::from_uuid(cursor)),
        None => order_messages(messages),
    };
    Ok(Json(result))
}

/// POST /api/chat/conversations/:id/messages — Send a message.
#[utoipa::path(
    post,
    path = "/api/chat/conversations/{id}/messages",
    params(("id" = Uuid, Path, description = "Conversation UUID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageRecord),
        (status = 404, description = "Conversation not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<MessageRecord>), AppError> {
    let req = extract_json(body)?;
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("body must not be empty".to_string()));
    }
    if !state.conversations.contains(&id) {
        return Err(AppError::NotFound(format!("conversation {id} not found")));
    }

    let sender_id = match (caller.user_id, req.sender_id) {
        (Some(user), _) => user,
        (None, Some(explicit)) => {
            if !state.users.contains(&explicit) {
                return Err(AppError::Validation(format!(
                    "sender {explicit} is not a known user"
                )));
            }
            UserId::from_uuid(explicit)
        }
        (None, None) => state.admin_user_id,
    };

    let message = MessageRecord {
        id: MessageId::new(),
        conversation_id: ConversationId::from_uuid(id),
        sender_id,
        body: req.body,
        sent_at: Utc::now(),
    };
    state.messages.insert(*message.id.as_uuid(), message.clone());
    state.chat_feed.publish(message.clone());

    Ok((axum::http::StatusCode::CREATED, Json(message)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
