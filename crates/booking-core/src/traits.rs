//! Common traits for repositories and collaborators
//!
//! Defines abstractions for persistence and for the external capabilities the
//! scheduling core depends on (lead ownership, contact lookup, notifications).

use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AvailabilityOverride, AvailabilityRule,
    ConsumerContact, LeadContactSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Generic tenant-scoped repository trait for CRUD operations
///
/// Every lookup is keyed by organization so one tenant can never reach
/// another tenant's rows.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find entity by ID within an organization
    async fn find_by_id(&self, id: Uuid, organization_id: Uuid) -> Result<Option<T>, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID within an organization
    async fn delete(&self, id: Uuid, organization_id: Uuid) -> Result<bool, AppError>;
}

/// Availability rule store
#[async_trait]
pub trait RuleRepository: Repository<AvailabilityRule> {
    /// All rules of an agent, ordered by weekday then start time
    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<AvailabilityRule>, AppError>;
}

/// Availability override store
#[async_trait]
pub trait OverrideRepository: Repository<AvailabilityOverride> {
    /// Overrides of an agent with `from <= date <= to`, ordered by date
    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilityOverride>, AppError>;

    /// Insert or replace the override for (organization, user, date)
    async fn upsert(&self, entity: &AvailabilityOverride) -> Result<AvailabilityOverride, AppError>;
}

/// Appointment store
#[async_trait]
pub trait AppointmentRepository: Repository<Appointment> {
    /// List appointments of an organization, ordered by start time
    async fn list(
        &self,
        organization_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppError>;

    /// Non-cancelled appointments of an agent overlapping `[from, to)`
    async fn find_occupying(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppError>;

    /// Overwrite the status of an appointment
    async fn update_status(
        &self,
        id: Uuid,
        organization_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppError>;
}

/// Resolves and mutates which agent owns a lead
#[async_trait]
pub trait LeadAssigner: Send + Sync {
    /// Agent currently assigned to the lead, if any
    async fn get_assigned_agent_id(
        &self,
        lead_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>;

    /// Assign the lead to an agent
    ///
    /// Implementations fail with `AppError::Conflict` when another agent
    /// claimed the lead in the meantime.
    async fn assign_lead(
        &self,
        lead_id: Uuid,
        agent_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError>;
}

/// Read-only lead contact lookups
#[async_trait]
pub trait LeadDirectory: Send + Sync {
    /// Contact summaries for a batch of leads; unknown ids are absent from the map
    async fn contact_summaries(
        &self,
        lead_ids: &[Uuid],
        organization_id: Uuid,
    ) -> Result<HashMap<Uuid, LeadContactSummary>, AppError>;

    /// Consumer contact of a lead, used for visit invites
    async fn consumer_contact(
        &self,
        lead_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<ConsumerContact>, AppError>;
}

/// Outbound notifications to consumers
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a visit invite for an appointment starting at `when`
    async fn send_visit_invite(
        &self,
        consumer_email: &str,
        consumer_name: &str,
        when: DateTime<Utc>,
        address: &str,
    ) -> Result<(), AppError>;
}
