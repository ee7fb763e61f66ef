//! Lead ownership and contact lookups
//!
//! Reads the lead-management `leads` table. The only write is the
//! conditional claim of an unassigned lead.

use booking_core::{
    models::{ConsumerContact, LeadContactSummary},
    traits::{LeadAssigner, LeadDirectory},
    AppError, AppResult,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const LEAD_CONTACT_COLUMNS: &str = r#"
    id, consumer_first_name, consumer_last_name, consumer_email, consumer_phone,
    address_street, address_house_number, address_zip_code, address_city
"#;

/// PostgreSQL implementation of LeadAssigner and LeadDirectory
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    /// Create a new lead repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadAssigner for PgLeadRepository {
    #[instrument(skip(self))]
    async fn get_assigned_agent_id(&self, lead_id: Uuid, organization_id: Uuid) -> AppResult<Option<Uuid>> {
        debug!("Resolving assigned agent of lead {}", lead_id);

        let row: Option<(Option<Uuid>,)> = sqlx::query_as(
            "SELECT assigned_agent_id FROM leads WHERE id = $1 AND organization_id = $2",
        )
        .bind(lead_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error resolving agent of lead {}: {}", lead_id, e);
            AppError::Database(format!("Failed to load lead: {}", e))
        })?;

        match row {
            Some((agent_id,)) => Ok(agent_id),
            None => Err(AppError::NotFound(format!("Lead {} not found", lead_id))),
        }
    }

    /// Claim the lead only while it is unassigned (or already ours)
    #[instrument(skip(self))]
    async fn assign_lead(&self, lead_id: Uuid, agent_id: Uuid, organization_id: Uuid) -> AppResult<()> {
        debug!("Assigning lead {} to agent {}", lead_id, agent_id);

        let result = sqlx::query(
            r#"
            UPDATE leads
            SET assigned_agent_id = $2,
                updated_at = NOW()
            WHERE id = $1
              AND organization_id = $3
              AND (assigned_agent_id IS NULL OR assigned_agent_id = $2)
            "#,
        )
        .bind(lead_id)
        .bind(agent_id)
        .bind(organization_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error assigning lead {}: {}", lead_id, e);
            AppError::Database(format!("Failed to assign lead: {}", e))
        })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: either the lead is gone or someone else won the claim
        match self.get_assigned_agent_id(lead_id, organization_id).await? {
            Some(current) => {
                warn!(
                    "Lead {} was claimed by agent {} before agent {}",
                    lead_id, current, agent_id
                );
                Err(AppError::Conflict(format!(
                    "Lead {} is already assigned to another agent",
                    lead_id
                )))
            }
            None => Err(AppError::Conflict(format!(
                "Lead {} could not be assigned",
                lead_id
            ))),
        }
    }
}

#[async_trait]
impl LeadDirectory for PgLeadRepository {
    #[instrument(skip(self, lead_ids), fields(count = lead_ids.len()))]
    async fn contact_summaries(
        &self,
        lead_ids: &[Uuid],
        organization_id: Uuid,
    ) -> AppResult<HashMap<Uuid, LeadContactSummary>> {
        if lead_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {} FROM leads WHERE id = ANY($1) AND organization_id = $2",
            LEAD_CONTACT_COLUMNS
        );
        let rows = sqlx::query_as::<sqlx::Postgres, LeadContactRow>(&sql)
            .bind(lead_ids)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading lead contacts: {}", e);
                AppError::Database(format!("Failed to load lead contacts: {}", e))
            })?;

        debug!("Loaded {} of {} lead contacts", rows.len(), lead_ids.len());

        Ok(rows
            .into_iter()
            .map(|row| (row.id, row.summary()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn consumer_contact(&self, lead_id: Uuid, organization_id: Uuid) -> AppResult<Option<ConsumerContact>> {
        let sql = format!(
            "SELECT {} FROM leads WHERE id = $1 AND organization_id = $2",
            LEAD_CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<sqlx::Postgres, LeadContactRow>(&sql)
            .bind(lead_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading consumer of lead {}: {}", lead_id, e);
                AppError::Database(format!("Failed to load lead contact: {}", e))
            })?;

        Ok(row.map(LeadContactRow::into_contact))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct LeadContactRow {
    id: Uuid,
    consumer_first_name: Option<String>,
    consumer_last_name: Option<String>,
    consumer_email: Option<String>,
    consumer_phone: Option<String>,
    address_street: Option<String>,
    address_house_number: Option<String>,
    address_zip_code: Option<String>,
    address_city: Option<String>,
}

impl LeadContactRow {
    fn name(&self) -> String {
        join_present(
            &[
                self.consumer_first_name.as_deref(),
                self.consumer_last_name.as_deref(),
            ],
            " ",
        )
    }

    /// "Street 12, 1234 AB City"
    fn address(&self) -> Option<String> {
        let street = join_present(
            &[self.address_street.as_deref(), self.address_house_number.as_deref()],
            " ",
        );
        let place = join_present(
            &[self.address_zip_code.as_deref(), self.address_city.as_deref()],
            " ",
        );
        let full = join_present(&[Some(street.as_str()), Some(place.as_str())], ", ");
        (!full.is_empty()).then_some(full)
    }

    fn summary(self) -> LeadContactSummary {
        LeadContactSummary {
            lead_id: self.id,
            name: self.name(),
            phone: self.consumer_phone.clone(),
            address: self.address(),
        }
    }

    fn into_contact(self) -> ConsumerContact {
        ConsumerContact {
            name: self.name(),
            address: self.address(),
            email: self.consumer_email,
        }
    }
}

fn join_present(parts: &[Option<&str>], separator: &str) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
