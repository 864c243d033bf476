//! # Database Persistence
//!
//! Thin data-access layer over PostgreSQL. The in-memory stores remain the
//! runtime source of truth; these modules make them durable. On startup,
//! [`crate::state::AppState::hydrate_from_db`] loads everything back.
//!
//! ## Expected schema
//!
//! ```sql
//! CREATE TABLE vehicles (
//!     id                  UUID PRIMARY KEY,
//!     vin                 TEXT NOT NULL,
//!     year                INTEGER NOT NULL,
//!     make                TEXT NOT NULL,
//!     model               TEXT NOT NULL,
//!     trim                TEXT,
//!     status              TEXT NOT NULL,
//!     title_status        TEXT NOT NULL,
//!     bought_price_cents  BIGINT,
//!     purchase_date       DATE,
//!     sold_price_cents    BIGINT,
//!     buyer_name          TEXT,
//!     sale_date           DATE,
//!     expense_total_cents BIGINT NOT NULL,
//!     created_at          TIMESTAMPTZ NOT NULL,
//!     updated_at          TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE arb_cases (
//!     id                      UUID PRIMARY KEY,
//!     vehicle_id              UUID NOT NULL,
//!     arb_type                TEXT NOT NULL,
//!     outcome                 TEXT NOT NULL,
//!     adjustment_amount_cents BIGINT,
//!     transport_type          TEXT,
//!     transport_location      TEXT,
//!     transport_date          DATE,
//!     transport_cost_cents    BIGINT,
//!     notes                   TEXT,
//!     opened_at               TIMESTAMPTZ NOT NULL,
//!     opened_by               UUID NOT NULL,
//!     resolved_at             TIMESTAMPTZ,
//!     resolved_by             UUID
//! );
//! -- One pending case per vehicle, enforced at the data layer too.
//! CREATE UNIQUE INDEX one_pending_case_per_vehicle
//!     ON arb_cases (vehicle_id) WHERE outcome = 'pending';
//!
//! CREATE TABLE users (
//!     id              UUID PRIMARY KEY,
//!     email           TEXT NOT NULL UNIQUE,
//!     display_name    TEXT NOT NULL,
//!     role            TEXT NOT NULL,
//!     status          TEXT NOT NULL,
//!     password_digest TEXT NOT NULL,
//!     created_at      TIMESTAMPTZ NOT NULL,
//!     updated_at      TIMESTAMPTZ NOT NULL
//! );
//! ```

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod arb_cases;
pub mod users;
pub mod vehicles;

/// Initialize the connection pool from `DATABASE_URL`.
///
/// Returns `Ok(None)` when the variable is unset or empty — the API then
/// runs in in-memory-only mode.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::info!("DATABASE_URL not set — running without persistence");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;
    tracing::info!("connected to PostgreSQL");
    Ok(Some(pool))
}
