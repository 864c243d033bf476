//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! The in-memory stores are the runtime source of truth. When a Postgres
//! pool is configured, vehicles, arbitration cases, and users are also
//! persisted and the stores are hydrated from the database on startup.
//! Tasks, events, and chat live in memory only.
//!
//! The relational store behind the stores is the single source of truth
//! across restarts; there is no other server-side state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_arb::ArbCase;
use backlot_core::{
    ConversationId, EventId, MessageId, TaskId, UserId, ValidationError, Vehicle,
};

use crate::auth::Role;
use crate::chat::MessageFeed;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because we never hold the lock across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Users --------------------------------------------------------------------

/// User account status.
///
/// Free-form status input from clients is normalized through
/// [`UserStatus::normalize`] so only these two values are ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Account can sign in.
    Active,
    /// Account is disabled but retained for history.
    Inactive,
}

impl UserStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Normalize free-form status input. Case and surrounding whitespace
    /// are ignored; anything unrecognized is rejected.
    pub fn normalize(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "enabled" => Some(Self::Active),
            "inactive" | "disabled" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salted SHA-256 digest of a password, in `sha256$<salt>$<hex>` form.
///
/// The salt is the user's own UUID, so digests are never comparable
/// across accounts.
pub fn password_digest(salt: &UserId, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_uuid().as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256${salt}${hex}")
}

/// Minimal email shape check: one `@` with non-empty local part and a
/// domain containing a dot. Input is lowercased and trimmed.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_ascii_lowercase();
    let invalid = || ValidationError::InvalidEmail(raw.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email)
}

/// A back-office user account profile.
///
/// The password digest never serializes — API responses use a dedicated
/// DTO, and even a debug dump of the record omits the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    #[schema(value_type = Uuid)]
    pub id: UserId,
    /// Normalized (lowercased) email address. Unique across accounts.
    pub email: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Access role.
    pub role: Role,
    /// Account status.
    pub status: UserStatus,
    /// Salted credential digest. Never serialized (utoipa honors the
    /// serde skip, so it is absent from the schema too).
    #[serde(skip)]
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new active user with a freshly salted password digest.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a malformed email or empty
    /// display name.
    pub fn new(
        email: &str,
        display_name: impl Into<String>,
        role: Role,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let email = normalize_email(email)?;
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "display_name",
            });
        }
        let id = UserId::new();
        Ok(Self {
            id,
            email,
            display_name,
            role,
            status: UserStatus::Active,
            password_digest: password_digest(&id, password),
            created_at: now,
            updated_at: now,
        })
    }
}

// -- Tasks --------------------------------------------------------------------

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Open,
    /// Being worked.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// A scheduled back-office task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskRecord {
    #[schema(value_type = Uuid)]
    pub id: TaskId,
    /// Short description shown in lists.
    pub title: String,
    /// Longer free-form detail.
    pub detail: Option<String>,
    /// User the task is assigned to.
    #[schema(value_type = Option<Uuid>)]
    pub assignee_id: Option<UserId>,
    /// When the task is due.
    pub due_date: Option<NaiveDate>,
    /// Workflow status.
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Events -------------------------------------------------------------------

/// A calendar event (delivery, auction run, inspection appointment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    #[schema(value_type = Uuid)]
    pub id: EventId,
    /// Short description shown on the calendar.
    pub title: String,
    /// Where the event happens.
    pub location: Option<String>,
    /// User responsible for the event.
    #[schema(value_type = Option<Uuid>)]
    pub assignee_id: Option<UserId>,
    /// Start time (UTC). Always before `ends_at`.
    pub starts_at: DateTime<Utc>,
    /// End time (UTC).
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// -- Chat ---------------------------------------------------------------------

/// A chat conversation between back-office users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConversationRecord {
    #[schema(value_type = Uuid)]
    pub id: ConversationId,
    /// Conversation title shown in the sidebar.
    pub name: String,
    /// Users in the conversation.
    #[schema(value_type = Vec<Uuid>)]
    pub participant_ids: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// One chat message.
///
/// Ordering within a conversation is by (`sent_at`, `id`); consumers
/// de-duplicate by `id` because feed delivery is at-least-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageRecord {
    #[schema(value_type = Uuid)]
    pub id: MessageId,
    /// The conversation this message belongs to.
    #[schema(value_type = Uuid)]
    pub conversation_id: ConversationId,
    /// Author of the message.
    #[schema(value_type = Uuid)]
    pub sender_id: UserId,
    /// Message text.
    pub body: String,
    /// When the server accepted the message.
    pub sent_at: DateTime<Utc>,
}

// -- Application State --------------------------------------------------------

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage
/// in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Vehicles on (and off) the lot.
    pub vehicles: Store<Vehicle>,
    /// Arbitration cases, open and resolved.
    pub arb_cases: Store<ArbCase>,
    /// User account profiles.
    pub users: Store<UserRecord>,
    /// Scheduled tasks.
    pub tasks: Store<TaskRecord>,
    /// Calendar events.
    pub events: Store<EventRecord>,
    /// Chat conversations.
    pub conversations: Store<ConversationRecord>,
    /// Chat messages, keyed by message id.
    pub messages: Store<MessageRecord>,

    /// Live chat feed. New messages are published here for connected
    /// subscribers; the poll endpoint covers clients that missed the push.
    pub chat_feed: MessageFeed,

    /// PostgreSQL connection pool for durable persistence.
    /// When `None`, the API operates in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    /// The bootstrap administrator account. Protected: user-management
    /// routes refuse to modify or delete it.
    pub admin_user_id: UserId,

    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a new application state with the given configuration and
    /// optional database pool.
    ///
    /// Seeds the protected bootstrap administrator account.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let now = Utc::now();
        let users = Store::new();
        let admin = UserRecord::new(
            "admin@backlot.local",
            "Administrator",
            Role::Admin,
            // Placeholder credential; a real deployment rotates it on first
            // login. Sign-in is handled by the auth middleware, not here.
            "changeme",
            now,
        )
        .expect("bootstrap admin account is statically valid");
        let admin_user_id = admin.id;
        users.insert(*admin.id.as_uuid(), admin);

        Self {
            vehicles: Store::new(),
            arb_cases: Store::new(),
            users,
            tasks: Store::new(),
            events: Store::new(),
            conversations: Store::new(),
            messages: Store::new(),
            chat_feed: MessageFeed::new(256),
            db_pool,
            admin_user_id,
            config,
        }
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available. Loads all
    /// persisted vehicles, arbitration cases, and users into the in-memory
    /// stores so that read operations remain fast and synchronous.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let vehicles = crate::db::vehicles::load_all(pool)
            .await
            .map_err(|e| format!("failed to load vehicles: {e}"))?;
        let vehicle_count = vehicles.len();
        for record in vehicles {
            self.vehicles.insert(*record.id.as_uuid(), record);
        }

        let cases = crate::db::arb_cases::load_all(pool)
            .await
            .map_err(|e| format!("failed to load arbitration cases: {e}"))?;
        let case_count = cases.len();
        for record in cases {
            self.arb_cases.insert(*record.id.as_uuid(), record);
        }

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for record in users {
            self.users.insert(*record.id.as_uuid(), record);
        }

        tracing::info!(
            vehicles = vehicle_count,
            arb_cases = case_count,
            users = user_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
