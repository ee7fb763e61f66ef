//! In-memory stores and collaborators for tests
//!
//! Enabled for this crate's unit tests and, through the `test-util` feature,
//! for downstream test suites.

use async_trait::async_trait;
use booking_core::{
    models::{
        Appointment, AppointmentFilter, AppointmentStatus, AvailabilityOverride,
        AvailabilityRule, ConsumerContact, LeadContactSummary,
    },
    traits::{
        AppointmentRepository, LeadAssigner, LeadDirectory, Notifier, OverrideRepository,
        Repository, RuleRepository,
    },
    AppError, AppResult,
};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Rule store backed by a vector
#[derive(Default)]
pub struct InMemoryRules {
    rows: Mutex<Vec<AvailabilityRule>>,
}

impl InMemoryRules {
    pub fn with(rows: Vec<AvailabilityRule>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn all(&self) -> Vec<AvailabilityRule> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl Repository<AvailabilityRule> for InMemoryRules {
    async fn find_by_id(&self, id: Uuid, organization_id: Uuid) -> AppResult<Option<AvailabilityRule>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|r| r.id == id && r.organization_id == organization_id)
            .cloned())
    }

    async fn create(&self, entity: &AvailabilityRule) -> AppResult<AvailabilityRule> {
        self.rows.lock().push(entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &AvailabilityRule) -> AppResult<AvailabilityRule> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|r| r.id == entity.id && r.organization_id == entity.organization_id)
            .ok_or_else(|| AppError::RuleNotFound(entity.id.to_string()))?;
        *row = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.organization_id == organization_id));
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl RuleRepository for InMemoryRules {
    async fn list_for_user(&self, user_id: Uuid, organization_id: Uuid) -> AppResult<Vec<AvailabilityRule>> {
        let mut rules: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|r| r.user_id == user_id && r.organization_id == organization_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.weekday, r.start_time));
        Ok(rules)
    }
}

/// Override store backed by a vector, unique per (organization, user, date)
#[derive(Default)]
pub struct InMemoryOverrides {
    rows: Mutex<Vec<AvailabilityOverride>>,
}

impl InMemoryOverrides {
    pub fn with(rows: Vec<AvailabilityOverride>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn all(&self) -> Vec<AvailabilityOverride> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl Repository<AvailabilityOverride> for InMemoryOverrides {
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> AppResult<Option<AvailabilityOverride>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|o| o.id == id && o.organization_id == organization_id)
            .cloned())
    }

    async fn create(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        self.upsert(entity).await
    }

    async fn update(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        self.upsert(entity).await
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|o| !(o.id == id && o.organization_id == organization_id));
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl OverrideRepository for InMemoryOverrides {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        let mut overrides: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|o| o.user_id == user_id && o.organization_id == organization_id)
            .filter(|o| from.map_or(true, |from| o.date >= from))
            .filter(|o| to.map_or(true, |to| o.date <= to))
            .cloned()
            .collect();
        overrides.sort_by_key(|o| o.date);
        Ok(overrides)
    }

    async fn upsert(&self, entity: &AvailabilityOverride) -> AppResult<AvailabilityOverride> {
        let mut rows = self.rows.lock();
        let existing = rows.iter_mut().find(|o| {
            o.organization_id == entity.organization_id
                && o.user_id == entity.user_id
                && o.date == entity.date
        });
        match existing {
            Some(row) => {
                let id = row.id;
                let created_at = row.created_at;
                *row = AvailabilityOverride {
                    id,
                    created_at,
                    ..entity.clone()
                };
                Ok(row.clone())
            }
            None => {
                rows.push(entity.clone());
                Ok(entity.clone())
            }
        }
    }
}

/// Appointment store backed by a vector
#[derive(Default)]
pub struct InMemoryAppointments {
    rows: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointments {
    pub fn with(rows: Vec<Appointment>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl Repository<Appointment> for InMemoryAppointments {
    async fn find_by_id(&self, id: Uuid, organization_id: Uuid) -> AppResult<Option<Appointment>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|a| a.id == id && a.organization_id == organization_id)
            .cloned())
    }

    async fn create(&self, entity: &Appointment) -> AppResult<Appointment> {
        self.rows.lock().push(entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Appointment) -> AppResult<Appointment> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|a| a.id == entity.id && a.organization_id == entity.organization_id)
            .ok_or_else(|| AppError::AppointmentNotFound(entity.id.to_string()))?;
        *row = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|a| !(a.id == id && a.organization_id == organization_id));
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointments {
    async fn list(&self, organization_id: Uuid, filter: &AppointmentFilter) -> AppResult<Vec<Appointment>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| filter.user_id.map_or(true, |v| a.user_id == v))
            .filter(|a| filter.lead_id.map_or(true, |v| a.lead_id == Some(v)))
            .filter(|a| filter.appointment_type.map_or(true, |v| a.appointment_type == v))
            .filter(|a| filter.status.map_or(true, |v| a.status == v))
            .filter(|a| filter.from.map_or(true, |v| a.start_time >= v))
            .filter(|a| filter.to.map_or(true, |v| a.start_time < v))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn find_occupying(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|a| a.user_id == user_id && a.organization_id == organization_id)
            .filter(|a| a.occupies_time() && a.overlaps(from, to))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        organization_id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Option<Appointment>> {
        let mut rows = self.rows.lock();
        Ok(rows
            .iter_mut()
            .find(|a| a.id == id && a.organization_id == organization_id)
            .map(|a| {
                a.status = status;
                a.updated_at = Utc::now();
                a.clone()
            }))
    }
}

/// Lead ownership and contact data keyed by lead id
#[derive(Default)]
pub struct InMemoryLeads {
    assignments: Mutex<HashMap<Uuid, Option<Uuid>>>,
    summaries: Mutex<HashMap<Uuid, LeadContactSummary>>,
    contacts: Mutex<HashMap<Uuid, ConsumerContact>>,
}

impl InMemoryLeads {
    /// Register a lead, optionally already assigned to an agent
    pub fn add_lead(&self, lead_id: Uuid, agent_id: Option<Uuid>) {
        self.assignments.lock().insert(lead_id, agent_id);
    }

    pub fn add_summary(&self, summary: LeadContactSummary) {
        self.summaries.lock().insert(summary.lead_id, summary);
    }

    pub fn add_contact(&self, lead_id: Uuid, contact: ConsumerContact) {
        self.contacts.lock().insert(lead_id, contact);
    }

    pub fn assigned_agent(&self, lead_id: Uuid) -> Option<Uuid> {
        self.assignments.lock().get(&lead_id).copied().flatten()
    }
}

#[async_trait]
impl LeadAssigner for InMemoryLeads {
    async fn get_assigned_agent_id(&self, lead_id: Uuid, _organization_id: Uuid) -> AppResult<Option<Uuid>> {
        self.assignments
            .lock()
            .get(&lead_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead_id)))
    }

    async fn assign_lead(&self, lead_id: Uuid, agent_id: Uuid, _organization_id: Uuid) -> AppResult<()> {
        let mut assignments = self.assignments.lock();
        let slot = assignments
            .get_mut(&lead_id)
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead_id)))?;
        match slot {
            Some(current) if *current != agent_id => Err(AppError::Conflict(format!(
                "Lead {} was claimed by another agent",
                lead_id
            ))),
            _ => {
                *slot = Some(agent_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl LeadDirectory for InMemoryLeads {
    async fn contact_summaries(
        &self,
        lead_ids: &[Uuid],
        _organization_id: Uuid,
    ) -> AppResult<HashMap<Uuid, LeadContactSummary>> {
        let summaries = self.summaries.lock();
        Ok(lead_ids
            .iter()
            .filter_map(|id| summaries.get(id).map(|s| (*id, s.clone())))
            .collect())
    }

    async fn consumer_contact(&self, lead_id: Uuid, _organization_id: Uuid) -> AppResult<Option<ConsumerContact>> {
        Ok(self.contacts.lock().get(&lead_id).cloned())
    }
}

/// Invite captured by `RecordingNotifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInvite {
    pub email: String,
    pub name: String,
    pub when: DateTime<Utc>,
    pub address: String,
}

/// Notifier that records invites, or fails every send when `failing`
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentInvite>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<SentInvite> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_visit_invite(
        &self,
        consumer_email: &str,
        consumer_name: &str,
        when: DateTime<Utc>,
        address: &str,
    ) -> AppResult<()> {
        if self.failing {
            return Err(AppError::Notification("mail relay unavailable".to_string()));
        }
        self.sent.lock().push(SentInvite {
            email: consumer_email.to_string(),
            name: consumer_name.to_string(),
            when,
            address: address.to_string(),
        });
        Ok(())
    }
}

/// Yield to the runtime until `done` holds or a bounded number of polls pass
///
/// Lets tests observe work handed to `tokio::spawn`.
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..50 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
}
