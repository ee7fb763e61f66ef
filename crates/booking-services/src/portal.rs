//! Consumer portal
//!
//! Lets the consumer behind a lead see when the lead's agent is free and
//! request a visit in one of those slots. The portal acts on behalf of the
//! assigned agent; access to the portal link itself is checked upstream.

use booking_core::{
    models::{Appointment, AppointmentType, Caller, DaySlots, NewAppointment},
    traits::{
        AppointmentRepository, LeadAssigner, LeadDirectory, Notifier, OverrideRepository,
        RuleRepository,
    },
    AppError, AppResult,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::availability::AvailabilityService;
use crate::booking::BookingService;
use crate::constants::{PORTAL_HORIZON_DAYS, PORTAL_VISIT_TITLE};
use crate::slot_generator::SlotQuery;

/// Visit requested by a consumer
#[derive(Debug, Clone, Deserialize)]
pub struct VisitRequest {
    pub lead_service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Portal service
pub struct PortalService<R, O, A, L, D, N>
where
    R: RuleRepository + ?Sized,
    O: OverrideRepository + ?Sized,
    A: AppointmentRepository + ?Sized,
    L: LeadAssigner + ?Sized,
    D: LeadDirectory + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    availability: Arc<AvailabilityService<R, O, A>>,
    booking: Arc<BookingService<A, L, D, N>>,
    lead_assigner: Arc<L>,
}

impl<R, O, A, L, D, N> PortalService<R, O, A, L, D, N>
where
    R: RuleRepository + ?Sized,
    O: OverrideRepository + ?Sized,
    A: AppointmentRepository + ?Sized,
    L: LeadAssigner + ?Sized,
    D: LeadDirectory + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    pub fn new(
        availability: Arc<AvailabilityService<R, O, A>>,
        booking: Arc<BookingService<A, L, D, N>>,
        lead_assigner: Arc<L>,
    ) -> Self {
        Self {
            availability,
            booking,
            lead_assigner,
        }
    }

    /// Slots of the lead's agent
    ///
    /// Without explicit dates the window starts today (UTC) and covers the
    /// portal horizon.
    #[instrument(skip(self))]
    pub async fn availability(
        &self,
        organization_id: Uuid,
        lead_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        slot_duration_minutes: i64,
    ) -> AppResult<Vec<DaySlots>> {
        let agent_id = self.assigned_agent(organization_id, lead_id).await?;

        let start_date = start_date.unwrap_or_else(|| Utc::now().date_naive());
        let end_date =
            end_date.unwrap_or_else(|| start_date + Duration::days(PORTAL_HORIZON_DAYS - 1));

        let query = SlotQuery {
            user_id: agent_id,
            start_date,
            end_date,
            slot_duration_minutes,
        };
        self.availability
            .slots_for_agent(organization_id, &query)
            .await
    }

    /// Book a visit in a currently free slot of the lead's agent
    ///
    /// The requested interval must match a generated slot exactly; anything
    /// else, including a slot taken since it was offered, is a conflict.
    #[instrument(skip(self, request))]
    pub async fn request_visit(
        &self,
        organization_id: Uuid,
        lead_id: Uuid,
        request: VisitRequest,
    ) -> AppResult<Appointment> {
        if request.end_time <= request.start_time {
            return Err(AppError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }

        let agent_id = self.assigned_agent(organization_id, lead_id).await?;

        // Slots are grouped by the agent's local date, which may differ from
        // the UTC date by one day either way.
        let requested_date = request.start_time.date_naive();
        let query = SlotQuery {
            user_id: agent_id,
            start_date: requested_date - Duration::days(1),
            end_date: requested_date + Duration::days(1),
            slot_duration_minutes: (request.end_time - request.start_time).num_minutes(),
        };
        let days = self
            .availability
            .slots_for_agent(organization_id, &query)
            .await?;

        let offered = days.iter().flat_map(|d| d.slots.iter()).any(|slot| {
            slot.start_time == request.start_time && slot.end_time == request.end_time
        });
        if !offered {
            warn!(
                "Portal visit for lead {} rejected: {} - {} is not a free slot",
                lead_id, request.start_time, request.end_time
            );
            return Err(AppError::Conflict(
                "the requested time is no longer available".to_string(),
            ));
        }

        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| PORTAL_VISIT_TITLE.to_string());

        let input = NewAppointment {
            user_id: Some(agent_id),
            lead_id: Some(lead_id),
            lead_service_id: Some(request.lead_service_id),
            appointment_type: AppointmentType::LeadVisit,
            title,
            description: request.description,
            location: None,
            start_time: request.start_time,
            end_time: request.end_time,
            all_day: false,
            send_confirmation: true,
        };

        let agent = Caller::agent(agent_id, organization_id);
        let appointment = self.booking.create(&agent, input).await?;

        info!(
            "Portal visit {} booked for lead {} with agent {}",
            appointment.id, lead_id, agent_id
        );
        Ok(appointment)
    }

    async fn assigned_agent(&self, organization_id: Uuid, lead_id: Uuid) -> AppResult<Uuid> {
        self.lead_assigner
            .get_assigned_agent_id(lead_id, organization_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No agent assigned to lead {}", lead_id)))
    }
}
