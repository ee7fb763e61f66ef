//! Availability rule repository implementation
//!
//! PostgreSQL-backed storage for the weekly availability rules of agents.

use booking_core::{
    models::AvailabilityRule,
    traits::{Repository, RuleRepository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of RuleRepository
pub struct PgRuleRepository {
    pool: PgPool,
}

impl PgRuleRepository {
    /// Create a new rule repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<AvailabilityRule> for PgRuleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid, organization_id: Uuid) -> AppResult<Option<AvailabilityRule>> {
        debug!("Finding availability rule by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, RuleRow>(
            r#"
            SELECT
                id, organization_id, user_id, weekday,
                start_time, end_time, timezone,
                created_at, updated_at
            FROM availability_rules
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding availability rule {}: {}", id, e);
            AppError::Database(format!("Failed to find availability rule: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &AvailabilityRule) -> AppResult<AvailabilityRule> {
        debug!("Creating availability rule for user {}", entity.user_id);

        let row = sqlx::query_as::<sqlx::Postgres, RuleRow>(
            r#"
            INSERT INTO availability_rules (
                id, organization_id, user_id, weekday,
                start_time, end_time, timezone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, organization_id, user_id, weekday,
                start_time, end_time, timezone,
                created_at, updated_at
            "#,
        )
        .bind(entity.id)
        .bind(entity.organization_id)
        .bind(entity.user_id)
        .bind(entity.weekday)
        .bind(entity.start_time)
        .bind(entity.end_time)
        .bind(&entity.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating availability rule: {}", e);
            AppError::Database(format!("Failed to create availability rule: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &AvailabilityRule) -> AppResult<AvailabilityRule> {
        debug!("Updating availability rule: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, RuleRow>(
            r#"
            UPDATE availability_rules
            SET weekday = $3,
                start_time = $4,
                end_time = $5,
                timezone = $6,
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, user_id, weekday,
                start_time, end_time, timezone,
                created_at, updated_at
            "#,
        )
        .bind(entity.id)
        .bind(entity.organization_id)
        .bind(entity.weekday)
        .bind(entity.start_time)
        .bind(entity.end_time)
        .bind(&entity.timezone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating availability rule {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update availability rule: {}", e))
        })?;

        row.map(Into::into)
            .ok_or_else(|| AppError::RuleNotFound(entity.id.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        debug!("Deleting availability rule: {}", id);

        let result = sqlx::query(
            "DELETE FROM availability_rules WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error deleting availability rule {}: {}", id, e);
            AppError::Database(format!("Failed to delete availability rule: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RuleRepository for PgRuleRepository {
    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Uuid, organization_id: Uuid) -> AppResult<Vec<AvailabilityRule>> {
        debug!("Listing availability rules for user {}", user_id);

        let rows = sqlx::query_as::<sqlx::Postgres, RuleRow>(
            r#"
            SELECT
                id, organization_id, user_id, weekday,
                start_time, end_time, timezone,
                created_at, updated_at
            FROM availability_rules
            WHERE user_id = $1 AND organization_id = $2
            ORDER BY weekday, start_time
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing availability rules for {}: {}", user_id, e);
            AppError::Database(format!("Failed to list availability rules: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: Uuid,
    organization_id: Uuid,
    user_id: Uuid,
    weekday: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    timezone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RuleRow> for AvailabilityRule {
    fn from(row: RuleRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            weekday: row.weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
