//! Appointment booking service
//!
//! Creates, reads and mutates appointments. Lead visits resolve lead
//! ownership through the `LeadAssigner`, auto-claiming unassigned leads for
//! the booking agent, and may send a best-effort invite to the consumer.

use booking_core::{
    models::{
        Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus,
        AppointmentType, Caller, LeadContactSummary, NewAppointment,
    },
    traits::{AppointmentRepository, LeadAssigner, LeadDirectory, Notifier},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::authorization::AuthorizationGuard;

/// Booking service
pub struct BookingService<A, L, D, N>
where
    A: AppointmentRepository + ?Sized,
    L: LeadAssigner + ?Sized,
    D: LeadDirectory + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    appointment_repo: Arc<A>,
    lead_assigner: Arc<L>,
    lead_directory: Arc<D>,
    notifier: Arc<N>,
    prevent_double_booking: bool,
}

impl<A, L, D, N> BookingService<A, L, D, N>
where
    A: AppointmentRepository + ?Sized,
    L: LeadAssigner + ?Sized,
    D: LeadDirectory + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    /// Create a new booking service
    pub fn new(
        appointment_repo: Arc<A>,
        lead_assigner: Arc<L>,
        lead_directory: Arc<D>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            appointment_repo,
            lead_assigner,
            lead_directory,
            notifier,
            prevent_double_booking: false,
        }
    }

    /// Reject bookings that overlap another non-cancelled appointment of the agent
    pub fn with_double_booking_guard(mut self, enabled: bool) -> Self {
        self.prevent_double_booking = enabled;
        self
    }

    /// Book an appointment
    ///
    /// # Flow
    /// 1. Validate title and interval
    /// 2. Resolve the agent the appointment is booked for
    /// 3. For lead visits, check lead ownership and claim unassigned leads
    /// 4. Persist as `scheduled`
    /// 5. Optionally hand a visit invite to the notifier in the background
    #[instrument(skip(self, input), fields(appointment_type = %input.appointment_type))]
    pub async fn create(&self, caller: &Caller, input: NewAppointment) -> AppResult<Appointment> {
        validate_title(&input.title)?;
        validate_interval(input.start_time, input.end_time)?;

        let user_id = AuthorizationGuard::resolve_target_user(caller, input.user_id)?;
        let org_id = caller.organization_id;

        let lead = if input.appointment_type == AppointmentType::LeadVisit {
            let lead_id = input.lead_id.ok_or_else(|| {
                AppError::Validation("lead_id is required for lead visits".to_string())
            })?;
            let lead_service_id = input.lead_service_id.ok_or_else(|| {
                AppError::Validation("lead_service_id is required for lead visits".to_string())
            })?;
            Some((lead_id, lead_service_id))
        } else {
            None
        };

        if self.prevent_double_booking {
            self.ensure_free(user_id, org_id, input.start_time, input.end_time, None)
                .await?;
        }

        if let Some((lead_id, _)) = lead {
            self.check_lead_ownership(caller, lead_id, user_id).await?;
        }

        let mut appointment = Appointment::new(
            org_id,
            user_id,
            input.appointment_type,
            input.title.trim(),
            input.start_time,
            input.end_time,
        );
        appointment.lead_id = lead.map(|(lead_id, _)| lead_id);
        appointment.lead_service_id = lead.map(|(_, service_id)| service_id);
        appointment.description = input.description;
        appointment.location = input.location;
        appointment.all_day = input.all_day;

        let created = self.appointment_repo.create(&appointment).await?;

        info!(
            "Booked {} appointment {} for user {} ({} - {})",
            created.appointment_type, created.id, created.user_id, created.start_time, created.end_time
        );

        if input.send_confirmation {
            if let Some(lead_id) = created.lead_id {
                self.dispatch_invite(&created, lead_id);
            }
        }

        Ok(created)
    }

    /// Fetch an appointment with its lead contact summary
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, caller: &Caller, id: Uuid) -> AppResult<AppointmentDetails> {
        let appointment = self.find(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, appointment.user_id, "appointment")?;

        let lead = match appointment.lead_id {
            Some(lead_id) => self
                .lead_directory
                .contact_summaries(&[lead_id], caller.organization_id)
                .await?
                .remove(&lead_id),
            None => None,
        };

        Ok(AppointmentDetails { appointment, lead })
    }

    /// List appointments ordered by start time
    ///
    /// Non-admins only ever see their own appointments regardless of the
    /// `user_id` filter they pass.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        caller: &Caller,
        mut filter: AppointmentFilter,
    ) -> AppResult<Vec<AppointmentDetails>> {
        if !caller.is_admin {
            filter.user_id = Some(caller.user_id);
        }

        let appointments = self
            .appointment_repo
            .list(caller.organization_id, &filter)
            .await?;

        let mut lead_ids: Vec<Uuid> = appointments.iter().filter_map(|a| a.lead_id).collect();
        lead_ids.sort_unstable();
        lead_ids.dedup();

        let summaries: HashMap<Uuid, LeadContactSummary> = if lead_ids.is_empty() {
            HashMap::new()
        } else {
            self.lead_directory
                .contact_summaries(&lead_ids, caller.organization_id)
                .await?
        };

        debug!(
            "Listed {} appointments with {} lead summaries",
            appointments.len(),
            summaries.len()
        );

        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let lead = appointment
                    .lead_id
                    .and_then(|lead_id| summaries.get(&lead_id).cloned());
                AppointmentDetails { appointment, lead }
            })
            .collect())
    }

    /// Partially update an appointment
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> AppResult<Appointment> {
        let mut appointment = self.find(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, appointment.user_id, "appointment")?;

        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        patch.apply_to(&mut appointment);
        validate_interval(appointment.start_time, appointment.end_time)?;

        if self.prevent_double_booking
            && appointment.occupies_time()
            && (patch.start_time.is_some() || patch.end_time.is_some())
        {
            self.ensure_free(
                appointment.user_id,
                appointment.organization_id,
                appointment.start_time,
                appointment.end_time,
                Some(appointment.id),
            )
            .await?;
        }

        appointment.updated_at = Utc::now();
        let updated = self.appointment_repo.update(&appointment).await?;

        info!("Updated appointment {}", updated.id);
        Ok(updated)
    }

    /// Overwrite the status of an appointment
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        caller: &Caller,
        id: Uuid,
        status: AppointmentStatus,
    ) -> AppResult<Appointment> {
        let appointment = self.find(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, appointment.user_id, "appointment")?;

        let updated = self
            .appointment_repo
            .update_status(id, caller.organization_id, status)
            .await?
            .ok_or_else(|| AppError::AppointmentNotFound(id.to_string()))?;

        info!(
            "Appointment {} status changed: {} -> {}",
            id, appointment.status, updated.status
        );
        Ok(updated)
    }

    /// Hard-delete an appointment
    #[instrument(skip(self))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let appointment = self.find(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, appointment.user_id, "appointment")?;

        if !self.appointment_repo.delete(id, caller.organization_id).await? {
            return Err(AppError::AppointmentNotFound(id.to_string()));
        }

        info!("Deleted appointment {}", id);
        Ok(())
    }

    async fn find(&self, caller: &Caller, id: Uuid) -> AppResult<Appointment> {
        self.appointment_repo
            .find_by_id(id, caller.organization_id)
            .await?
            .ok_or_else(|| AppError::AppointmentNotFound(id.to_string()))
    }

    /// Lead visits may only be booked by the lead's agent or an admin
    ///
    /// A non-admin booking an unassigned lead claims it.
    async fn check_lead_ownership(
        &self,
        caller: &Caller,
        lead_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        let assigned = self
            .lead_assigner
            .get_assigned_agent_id(lead_id, caller.organization_id)
            .await?;

        match assigned {
            Some(agent_id) if agent_id != user_id && !caller.is_admin => {
                warn!(
                    "User {} tried to book lead {} assigned to {}",
                    caller.user_id, lead_id, agent_id
                );
                Err(AppError::Forbidden(
                    "lead is assigned to another agent".to_string(),
                ))
            }
            None if !caller.is_admin => {
                self.lead_assigner
                    .assign_lead(lead_id, caller.user_id, caller.organization_id)
                    .await?;
                info!("Lead {} claimed by agent {}", lead_id, caller.user_id);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn ensure_free(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ignore: Option<Uuid>,
    ) -> AppResult<()> {
        let clashes = self
            .appointment_repo
            .find_occupying(user_id, organization_id, start, end)
            .await?;

        if let Some(clash) = clashes.iter().find(|a| Some(a.id) != ignore) {
            warn!(
                "Rejected double booking for user {}: overlaps appointment {}",
                user_id, clash.id
            );
            return Err(AppError::Conflict(format!(
                "Agent already has appointment {} between {} and {}",
                clash.id, clash.start_time, clash.end_time
            )));
        }
        Ok(())
    }

    /// Resolve the consumer contact and send the invite on a background task
    ///
    /// Never fails the booking: lookup and send errors are logged only.
    fn dispatch_invite(&self, appointment: &Appointment, lead_id: Uuid) {
        let directory = Arc::clone(&self.lead_directory);
        let notifier = Arc::clone(&self.notifier);
        let organization_id = appointment.organization_id;
        let appointment_id = appointment.id;
        let location = appointment.location.clone();
        let when = appointment.start_time;

        tokio::spawn(async move {
            let contact = match directory.consumer_contact(lead_id, organization_id).await {
                Ok(Some(contact)) => contact,
                Ok(None) => {
                    debug!("No consumer contact for lead {}, skipping invite", lead_id);
                    return;
                }
                Err(e) => {
                    warn!("Consumer contact lookup failed for lead {}: {}", lead_id, e);
                    return;
                }
            };

            let Some(email) = contact.email.filter(|e| !e.trim().is_empty()) else {
                debug!("Lead {} has no consumer e-mail, skipping invite", lead_id);
                return;
            };
            let address = contact.address.or(location).unwrap_or_default();

            match notifier.send_visit_invite(&email, &contact.name, when, &address).await {
                Ok(()) => debug!("Visit invite sent for appointment {}", appointment_id),
                Err(e) => warn!(
                    "Visit invite for appointment {} failed: {}",
                    appointment_id, e
                ),
            }
        });
    }
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::Validation(format!(
            "end_time ({}) must be after start_time ({})",
            end, start
        )));
    }
    Ok(())
}
