//! PostgreSQL backend
//!
//! Admission is a lazy `INSERT … ON CONFLICT DO NOTHING` followed by a single
//! conditional `UPDATE … WHERE count < $cap RETURNING`. The row lock taken by
//! the UPDATE serializes admits on one cell; different cells never contend.

use std::collections::HashMap;

use async_trait::async_trait;
use shared::models::{CapacitySettings, LineIdentity, ReservationRecord};
use sqlx::PgPool;

use super::{
    IdentityDirectory, InsertError, ReservationLedger, SettingsStore, SlotCounter, StoreError,
    StoreResult,
};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run pending migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    name: String,
    phone: String,
    email: String,
    date: String,
    time: String,
    adults: i32,
    children: i32,
    high_chairs: i32,
    dietary: String,
    special_needs: String,
    notes: String,
    slot_id: String,
    capacity_class: String,
    created_at: i64,
}

impl TryFrom<ReservationRow> for ReservationRecord {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let capacity_class = row
            .capacity_class
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("reservation {}: {e}", row.id)))?;
        Ok(ReservationRecord {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            date: row.date,
            time: row.time,
            adults: row.adults,
            children: row.children,
            high_chairs: row.high_chairs,
            dietary: row.dietary,
            special_needs: row.special_needs,
            notes: row.notes,
            slot_id: row.slot_id,
            capacity_class,
            created_at: row.created_at,
        })
    }
}

const RESERVATION_COLUMNS: &str = "id, name, phone, email, date, time, adults, children, \
     high_chairs, dietary, special_needs, notes, slot_id, capacity_class, created_at";

/// `UNIQUE (phone, date, time)` in the reservations migration
const IDENTITY_CONSTRAINT: &str = "reservations_identity";

/// Classify a unique violation on `reservations`
///
/// Only the identity constraint means the guest already booked; any other
/// unique key (the primary key) is an id collision the caller can retry.
fn unique_violation(constraint: Option<&str>, id: i64) -> InsertError {
    match constraint {
        Some(IDENTITY_CONSTRAINT) => InsertError::Duplicate,
        _ => InsertError::IdTaken(id),
    }
}

#[async_trait]
impl SlotCounter for PgStore {
    async fn try_admit(&self, date: &str, slot_id: &str, capacity: i32) -> StoreResult<bool> {
        sqlx::query(
            "INSERT INTO slot_counts (date, slot_id, count) VALUES ($1, $2, 0)
             ON CONFLICT (date, slot_id) DO NOTHING",
        )
        .bind(date)
        .bind(slot_id)
        .execute(&self.pool)
        .await?;

        let admitted: Option<(i32,)> = sqlx::query_as(
            "UPDATE slot_counts SET count = count + 1
             WHERE date = $1 AND slot_id = $2 AND count < $3
             RETURNING count",
        )
        .bind(date)
        .bind(slot_id)
        .bind(capacity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admitted.is_some())
    }

    async fn counts(&self, date: &str) -> StoreResult<HashMap<String, i32>> {
        let rows: Vec<(String, i32)> =
            sqlx::query_as("SELECT slot_id, count FROM slot_counts WHERE date = $1")
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn purge_before(&self, date: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM slot_counts WHERE date < $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReservationLedger for PgStore {
    async fn find_by_identity(
        &self,
        phone: &str,
        date: &str,
        time: &str,
    ) -> StoreResult<Option<ReservationRecord>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE phone = $1 AND date = $2 AND time = $3"
        ))
        .bind(phone)
        .bind(date)
        .bind(time)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ReservationRecord::try_from).transpose()
    }

    async fn insert(&self, record: &ReservationRecord) -> Result<(), InsertError> {
        let result = sqlx::query(&format!(
            "INSERT INTO reservations ({RESERVATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.email)
        .bind(&record.date)
        .bind(&record.time)
        .bind(record.adults)
        .bind(record.children)
        .bind(record.high_chairs)
        .bind(&record.dietary)
        .bind(&record.special_needs)
        .bind(&record.notes)
        .bind(&record.slot_id)
        .bind(record.capacity_class.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(unique_violation(db_err.constraint(), record.id))
            }
            Err(e) => Err(InsertError::Store(e.into())),
        }
    }

    async fn list_by_date(&self, date: &str) -> StoreResult<Vec<ReservationRecord>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE date = $1 ORDER BY time, created_at"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ReservationRecord::try_from).collect()
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn load_settings(&self) -> StoreResult<CapacitySettings> {
        let row: Option<CapacitySettings> = sqlx::query_as(
            "SELECT weekday_morning, weekday_afternoon, holiday_morning, holiday_afternoon,
                    updated_at, updated_by
             FROM capacity_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &CapacitySettings) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO capacity_settings
                (id, weekday_morning, weekday_afternoon, holiday_morning, holiday_afternoon,
                 updated_at, updated_by)
             VALUES (1, $1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                weekday_morning = $1, weekday_afternoon = $2,
                holiday_morning = $3, holiday_afternoon = $4,
                updated_at = $5, updated_by = $6",
        )
        .bind(settings.weekday_morning)
        .bind(settings.weekday_afternoon)
        .bind(settings.holiday_morning)
        .bind(settings.holiday_afternoon)
        .bind(settings.updated_at)
        .bind(&settings.updated_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for PgStore {
    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<LineIdentity>> {
        Ok(sqlx::query_as(
            "SELECT line_user_id, line_name, phone, created_at FROM line_users WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_identity(&self, identity: &LineIdentity) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO line_users (phone, line_user_id, line_name, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (phone) DO UPDATE SET
                line_user_id = $2, line_name = $3, created_at = $4",
        )
        .bind(&identity.phone)
        .bind(&identity.line_user_id)
        .bind(&identity.line_name)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_constraint_is_duplicate() {
        assert!(matches!(
            unique_violation(Some("reservations_identity"), 7),
            InsertError::Duplicate
        ));
    }

    #[test]
    fn test_primary_key_collision_is_retryable() {
        assert!(matches!(
            unique_violation(Some("reservations_pkey"), 7),
            InsertError::IdTaken(7)
        ));
        assert!(matches!(unique_violation(None, 9), InsertError::IdTaken(9)));
    }
}
