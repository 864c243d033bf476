//! Arbitration case persistence operations.
//!
//! All functions operate on the `arb_cases` table. The outcome write is a
//! conditional update (`WHERE outcome = 'pending'`) paired with the
//! vehicle write in one transaction, so a second submission — from this
//! node or another — can never resolve the same case twice.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use backlot_arb::{ArbCase, ArbOutcome, ArbType, TransportPlan};
use backlot_core::{ArbId, Money, UserId, Vehicle, VehicleId};

/// Insert a newly opened case.
pub async fn insert(pool: &PgPool, record: &ArbCase) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO arb_cases (id, vehicle_id, arb_type, outcome, adjustment_amount_cents,
                                transport_type, transport_location, transport_date,
                                transport_cost_cents, notes, opened_at, opened_by,
                                resolved_at, resolved_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(record.id.as_uuid())
    .bind(record.vehicle_id.as_uuid())
    .bind(record.arb_type.as_str())
    .bind(record.outcome.as_str())
    .bind(record.adjustment_amount.map(|m| m.cents()))
    .bind(record.transport.as_ref().and_then(|t| t.transport_type.clone()))
    .bind(record.transport.as_ref().and_then(|t| t.location.clone()))
    .bind(record.transport.as_ref().and_then(|t| t.date))
    .bind(record.transport.as_ref().map(|t| t.cost.cents()))
    .bind(&record.notes)
    .bind(record.opened_at)
    .bind(record.opened_by.as_uuid())
    .bind(record.resolved_at)
    .bind(record.resolved_by.map(|u| *u.as_uuid()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a resolved outcome and the vehicle it mutated, atomically.
///
/// The case update is conditional on the row still being pending; if it is
/// not (a concurrent writer got there first), the transaction rolls back
/// untouched and `Ok(false)` is returned. On `Ok(true)`, both writes
/// committed together.
pub async fn persist_outcome(
    pool: &PgPool,
    case: &ArbCase,
    vehicle: &Vehicle,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE arb_cases SET
             outcome = $1,
             adjustment_amount_cents = $2,
             transport_type = $3,
             transport_location = $4,
             transport_date = $5,
             transport_cost_cents = $6,
             notes = $7,
             resolved_at = $8,
             resolved_by = $9
         WHERE id = $10 AND outcome = 'pending'",
    )
    .bind(case.outcome.as_str())
    .bind(case.adjustment_amount.map(|m| m.cents()))
    .bind(case.transport.as_ref().and_then(|t| t.transport_type.clone()))
    .bind(case.transport.as_ref().and_then(|t| t.location.clone()))
    .bind(case.transport.as_ref().and_then(|t| t.date))
    .bind(case.transport.as_ref().map(|t| t.cost.cents()))
    .bind(&case.notes)
    .bind(case.resolved_at)
    .bind(case.resolved_by.map(|u| *u.as_uuid()))
    .bind(case.id.as_uuid())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    crate::db::vehicles::upsert(&mut *tx, vehicle).await?;
    tx.commit().await?;
    Ok(true)
}

/// Load all cases into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ArbCase>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ArbCaseRow>(
        "SELECT id, vehicle_id, arb_type, outcome, adjustment_amount_cents,
                transport_type, transport_location, transport_date, transport_cost_cents,
                notes, opened_at, opened_by, resolved_at, resolved_by
         FROM arb_cases ORDER BY opened_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ArbCaseRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ArbCaseRow {
    id: Uuid,
    vehicle_id: Uuid,
    arb_type: String,
    outcome: String,
    adjustment_amount_cents: Option<i64>,
    transport_type: Option<String>,
    transport_location: Option<String>,
    transport_date: Option<NaiveDate>,
    transport_cost_cents: Option<i64>,
    notes: Option<String>,
    opened_at: DateTime<Utc>,
    opened_by: Uuid,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by: Option<Uuid>,
}

impl ArbCaseRow {
    fn into_record(self) -> Result<ArbCase, sqlx::Error> {
        // Case type and outcome have no safe fallback — resurrecting a
        // resolved case as pending would let it be processed twice.
        let arb_type = ArbType::parse(&self.arb_type).ok_or_else(|| {
            tracing::error!(id = %self.id, arb_type = %self.arb_type, "unknown arb_type in database");
            sqlx::Error::Decode(
                format!("unknown arb_type '{}' for case {}", self.arb_type, self.id).into(),
            )
        })?;
        let outcome = ArbOutcome::parse(&self.outcome).ok_or_else(|| {
            tracing::error!(id = %self.id, outcome = %self.outcome, "unknown outcome in database");
            sqlx::Error::Decode(
                format!("unknown outcome '{}' for case {}", self.outcome, self.id).into(),
            )
        })?;

        let transport = match self.transport_cost_cents {
            Some(cents) => Some(
                TransportPlan::new(
                    self.transport_type,
                    self.transport_location,
                    self.transport_date,
                    Money::from_cents(cents),
                )
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            ),
            None => None,
        };

        Ok(ArbCase {
            id: ArbId::from_uuid(self.id),
            vehicle_id: VehicleId::from_uuid(self.vehicle_id),
            arb_type,
            outcome,
            adjustment_amount: self.adjustment_amount_cents.map(Money::from_cents),
            transport,
            notes: self.notes,
            opened_at: self.opened_at,
            opened_by: UserId::from_uuid(self.opened_by),
            resolved_at: self.resolved_at,
            resolved_by: self.resolved_by.map(UserId::from_uuid),
        })
    }
}
