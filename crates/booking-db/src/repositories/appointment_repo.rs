//! Appointment repository implementation
//!
//! Provides PostgreSQL-backed storage for appointments, including the
//! occupancy query used by slot generation and the double-booking guard.

use booking_core::{
    models::{Appointment, AppointmentFilter, AppointmentStatus, AppointmentType},
    traits::{AppointmentRepository, Repository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Column list shared by every appointment query
const APPOINTMENT_COLUMNS: &str = r#"
    id, organization_id, user_id, lead_id, lead_service_id,
    type, title, description, location,
    start_time, end_time, status, all_day,
    created_at, updated_at
"#;

/// PostgreSQL implementation of AppointmentRepository
pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    /// Create a new appointment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database type string to enum
    fn parse_type(s: &str) -> AppointmentType {
        AppointmentType::from_str(s).unwrap_or_else(|| {
            warn!("Unknown appointment type '{}' in database", s);
            AppointmentType::Standalone
        })
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> AppointmentStatus {
        AppointmentStatus::from_str(s).unwrap_or_else(|| {
            warn!("Unknown appointment status '{}' in database", s);
            AppointmentStatus::Scheduled
        })
    }
}

#[async_trait]
impl Repository<Appointment> for PgAppointmentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid, organization_id: Uuid) -> AppResult<Option<Appointment>> {
        debug!("Finding appointment by id: {}", id);

        let sql = format!(
            "SELECT {} FROM appointments WHERE id = $1 AND organization_id = $2",
            APPOINTMENT_COLUMNS
        );
        let result = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding appointment {}: {}", id, e);
                AppError::Database(format!("Failed to find appointment: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Appointment) -> AppResult<Appointment> {
        debug!("Creating appointment for user {}", entity.user_id);

        let sql = format!(
            r#"
            INSERT INTO appointments (
                id, organization_id, user_id, lead_id, lead_service_id,
                type, title, description, location,
                start_time, end_time, status, all_day
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(entity.id)
            .bind(entity.organization_id)
            .bind(entity.user_id)
            .bind(entity.lead_id)
            .bind(entity.lead_service_id)
            .bind(entity.appointment_type.to_string())
            .bind(&entity.title)
            .bind(&entity.description)
            .bind(&entity.location)
            .bind(entity.start_time)
            .bind(entity.end_time)
            .bind(entity.status.to_string())
            .bind(entity.all_day)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating appointment: {}", e);
                AppError::Database(format!("Failed to create appointment: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Appointment) -> AppResult<Appointment> {
        debug!("Updating appointment: {}", entity.id);

        let sql = format!(
            r#"
            UPDATE appointments
            SET title = $3,
                description = $4,
                location = $5,
                start_time = $6,
                end_time = $7,
                all_day = $8,
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(entity.id)
            .bind(entity.organization_id)
            .bind(&entity.title)
            .bind(&entity.description)
            .bind(&entity.location)
            .bind(entity.start_time)
            .bind(entity.end_time)
            .bind(entity.all_day)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating appointment {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update appointment: {}", e))
            })?;

        row.map(Into::into)
            .ok_or_else(|| AppError::AppointmentNotFound(entity.id.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        debug!("Deleting appointment: {}", id);

        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting appointment {}: {}", id, e);
                AppError::Database(format!("Failed to delete appointment: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    #[instrument(skip(self))]
    async fn list(&self, organization_id: Uuid, filter: &AppointmentFilter) -> AppResult<Vec<Appointment>> {
        debug!("Listing appointments with filter: {:?}", filter);

        let sql = format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::uuid IS NULL OR lead_id = $3)
              AND ($4::text IS NULL OR type = $4)
              AND ($5::text IS NULL OR status = $5)
              AND ($6::timestamptz IS NULL OR start_time >= $6)
              AND ($7::timestamptz IS NULL OR start_time < $7)
            ORDER BY start_time
            "#,
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(organization_id)
            .bind(filter.user_id)
            .bind(filter.lead_id)
            .bind(filter.appointment_type.map(|t| t.to_string()))
            .bind(filter.status.map(|s| s.to_string()))
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing appointments: {}", e);
                AppError::Database(format!("Failed to list appointments: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_occupying(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        debug!(
            "Finding appointments of user {} occupying {} - {}",
            user_id, from, to
        );

        let sql = format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE user_id = $1
              AND organization_id = $2
              AND status <> 'cancelled'
              AND start_time < $4
              AND end_time > $3
            ORDER BY start_time
            "#,
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(user_id)
            .bind(organization_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding occupying appointments for {}: {}", user_id, e);
                AppError::Database(format!("Failed to load appointments: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        organization_id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Option<Appointment>> {
        debug!("Setting status of appointment {} to {}", id, status);

        let sql = format!(
            r#"
            UPDATE appointments
            SET status = $3,
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, AppointmentRow>(&sql)
            .bind(id)
            .bind(organization_id)
            .bind(status.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating status of appointment {}: {}", id, e);
                AppError::Database(format!("Failed to update appointment status: {}", e))
            })?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    organization_id: Uuid,
    user_id: Uuid,
    lead_id: Option<Uuid>,
    lead_service_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    appointment_type: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    all_day: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            lead_id: row.lead_id,
            lead_service_id: row.lead_service_id,
            appointment_type: PgAppointmentRepository::parse_type(&row.appointment_type),
            title: row.title,
            description: row.description,
            location: row.location,
            start_time: row.start_time,
            end_time: row.end_time,
            status: PgAppointmentRepository::parse_status(&row.status),
            all_day: row.all_day,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_enums() {
        assert_eq!(
            PgAppointmentRepository::parse_type("lead_visit"),
            AppointmentType::LeadVisit
        );
        assert_eq!(
            PgAppointmentRepository::parse_status("no_show"),
            AppointmentStatus::NoShow
        );
        assert_eq!(
            PgAppointmentRepository::parse_status("archived"),
            AppointmentStatus::Scheduled
        );
    }
}
