//! Availability override repository implementation
//!
//! One override per (organization, user, date); writes go through an upsert
//! on that key so a second override for the same date replaces the first.

use booking_core::{
    models::AvailabilityOverride,
    traits::{OverrideRepository, Repository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of OverrideRepository
pub struct PgOverrideRepository {
    pool: PgPool,
}

impl PgOverrideRepository {
    /// Create a new override repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<AvailabilityOverride> for PgOverrideRepository {
    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> AppResult<Option<AvailabilityOverride>> {
        debug!("Finding availability override by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, OverrideRow>(
            r#"
            SELECT
                id, organization_id, user_id, date, is_available,
                start_time, end_time, timezone,
                created_at, updated_at
            FROM availability_overrides
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding availability override {}: {}", id, e);
            AppError::Database(format!("Failed to find availability override: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        self.upsert(entity).await
    }

    async fn update(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        self.upsert(entity).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        debug!("Deleting availability override: {}", id);

        let result = sqlx::query(
            "DELETE FROM availability_overrides WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error deleting availability override {}: {}", id, e);
            AppError::Database(format!("Failed to delete availability override: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OverrideRepository for PgOverrideRepository {
    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        debug!(
            "Listing availability overrides for user {} between {:?} and {:?}",
            user_id, from, to
        );

        let rows = sqlx::query_as::<sqlx::Postgres, OverrideRow>(
            r#"
            SELECT
                id, organization_id, user_id, date, is_available,
                start_time, end_time, timezone,
                created_at, updated_at
            FROM availability_overrides
            WHERE user_id = $1
              AND organization_id = $2
              AND ($3::date IS NULL OR date >= $3)
              AND ($4::date IS NULL OR date <= $4)
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing availability overrides for {}: {}", user_id, e);
            AppError::Database(format!("Failed to list availability overrides: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, entity))]
    async fn upsert(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        debug!(
            "Upserting availability override for user {} on {}",
            entity.user_id, entity.date
        );

        let row = sqlx::query_as::<sqlx::Postgres, OverrideRow>(
            r#"
            INSERT INTO availability_overrides (
                id, organization_id, user_id, date, is_available,
                start_time, end_time, timezone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (organization_id, user_id, date) DO UPDATE
            SET is_available = EXCLUDED.is_available,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                timezone = EXCLUDED.timezone,
                updated_at = NOW()
            RETURNING
                id, organization_id, user_id, date, is_available,
                start_time, end_time, timezone,
                created_at, updated_at
            "#,
        )
        .bind(entity.id)
        .bind(entity.organization_id)
        .bind(entity.user_id)
        .bind(entity.date)
        .bind(entity.is_available)
        .bind(entity.start_time)
        .bind(entity.end_time)
        .bind(&entity.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error upserting availability override: {}", e);
            AppError::Database(format!("Failed to store availability override: {}", e))
        })?;

        Ok(row.into())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct OverrideRow {
    id: Uuid,
    organization_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    is_available: bool,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    timezone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OverrideRow> for AvailabilityOverride {
    fn from(row: OverrideRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            date: row.date,
            is_available: row.is_available,
            start_time: row.start_time,
            end_time: row.end_time,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
