//! User persistence operations.
//!
//! All functions operate on the `users` table. Emails are stored
//! normalized (lowercased) and carry a UNIQUE constraint; the credential
//! digest round-trips through the database but never through the API.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use backlot_core::UserId;

use crate::auth::Role;
use crate::state::{UserRecord, UserStatus};

/// Insert or update a user row.
pub async fn upsert(pool: &PgPool, record: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, email, display_name, role, status, password_digest,
                            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE SET
             email = EXCLUDED.email,
             display_name = EXCLUDED.display_name,
             role = EXCLUDED.role,
             status = EXCLUDED.status,
             password_digest = EXCLUDED.password_digest,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(&record.email)
    .bind(&record.display_name)
    .bind(record.role.as_str())
    .bind(record.status.as_str())
    .bind(&record.password_digest)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a user row.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all users into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, display_name, role, status, password_digest, created_at, updated_at
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    status: String,
    password_digest: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        // Unknown role degrades to the least-privileged one; unknown
        // status degrades to inactive. Both are logged for investigation.
        let role = Role::parse(&self.role).unwrap_or_else(|| {
            tracing::error!(id = %self.id, role = %self.role, "unknown role in database — defaulting to seller");
            Role::Seller
        });
        let status = UserStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::error!(id = %self.id, status = %self.status, "unknown status in database — defaulting to inactive");
            UserStatus::Inactive
        });

        UserRecord {
            id: UserId::from_uuid(self.id),
            email: self.email,
            display_name: self.display_name,
            role,
            status,
            password_digest: self.password_digest,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
