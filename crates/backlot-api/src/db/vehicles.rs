//! Vehicle persistence operations.
//!
//! All functions operate on the `vehicles` table. Lifecycle constraints
//! are enforced at the application layer (via the `Vehicle` aggregate's
//! methods), not in SQL; monetary columns are integer cents.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use backlot_core::{Money, TitleStatus, Vehicle, VehicleId, VehicleStatus, Vin};

/// Insert or update a vehicle row.
///
/// Generic over the executor so it can run standalone on the pool or
/// inside a transaction (the arbitration outcome path).
pub async fn upsert<'e, E>(executor: E, record: &Vehicle) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO vehicles (id, vin, year, make, model, trim, status, title_status,
                               bought_price_cents, purchase_date, sold_price_cents, buyer_name,
                               sale_date, expense_total_cents, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
         ON CONFLICT (id) DO UPDATE SET
             vin = EXCLUDED.vin,
             year = EXCLUDED.year,
             make = EXCLUDED.make,
             model = EXCLUDED.model,
             trim = EXCLUDED.trim,
             status = EXCLUDED.status,
             title_status = EXCLUDED.title_status,
             bought_price_cents = EXCLUDED.bought_price_cents,
             purchase_date = EXCLUDED.purchase_date,
             sold_price_cents = EXCLUDED.sold_price_cents,
             buyer_name = EXCLUDED.buyer_name,
             sale_date = EXCLUDED.sale_date,
             expense_total_cents = EXCLUDED.expense_total_cents,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(record.vin.as_str())
    .bind(record.year)
    .bind(&record.make)
    .bind(&record.model)
    .bind(&record.trim)
    .bind(record.status.as_str())
    .bind(record.title_status.as_str())
    .bind(record.bought_price.map(|m| m.cents()))
    .bind(record.purchase_date)
    .bind(record.sold_price.map(|m| m.cents()))
    .bind(&record.buyer_name)
    .bind(record.sale_date)
    .bind(record.expense_total.cents())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Delete a vehicle row.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all vehicles into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Vehicle>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VehicleRow>(
        "SELECT id, vin, year, make, model, trim, status, title_status,
                bought_price_cents, purchase_date, sold_price_cents, buyer_name,
                sale_date, expense_total_cents, created_at, updated_at
         FROM vehicles ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(VehicleRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    vin: String,
    year: i32,
    make: String,
    model: String,
    trim: Option<String>,
    status: String,
    title_status: String,
    bought_price_cents: Option<i64>,
    purchase_date: Option<NaiveDate>,
    sold_price_cents: Option<i64>,
    buyer_name: Option<String>,
    sale_date: Option<NaiveDate>,
    expense_total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VehicleRow {
    fn into_record(self) -> Result<Vehicle, sqlx::Error> {
        // The VIN was validated on the way in; a row that fails here was
        // written by something other than this application.
        let vin = Vin::new(&self.vin).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let status = VehicleStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::error!(
                id = %self.id,
                status = %self.status,
                "unknown vehicle status in database — defaulting to pending; \
                 investigate: this may indicate data corruption"
            );
            VehicleStatus::Pending
        });
        let title_status = TitleStatus::parse(&self.title_status).unwrap_or_else(|| {
            tracing::error!(
                id = %self.id,
                title_status = %self.title_status,
                "unknown title status in database — defaulting to absent"
            );
            TitleStatus::Absent
        });

        Ok(Vehicle {
            id: VehicleId::from_uuid(self.id),
            vin,
            year: self.year,
            make: self.make,
            model: self.model,
            trim: self.trim,
            status,
            title_status,
            bought_price: self.bought_price_cents.map(Money::from_cents),
            purchase_date: self.purchase_date,
            sold_price: self.sold_price_cents.map(Money::from_cents),
            buyer_name: self.buyer_name,
            sale_date: self.sale_date,
            expense_total: Money::from_cents(self.expense_total_cents),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
