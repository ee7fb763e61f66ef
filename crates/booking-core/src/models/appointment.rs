//! Appointment and slot models
//!
//! Booked intervals on an agent's calendar, plus the derived slot types
//! produced by slot generation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::lead::LeadContactSummary;

/// Kind of appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    /// On-site visit tied to a lead and a requested service
    LeadVisit,
    /// Appointment without a lead
    #[default]
    Standalone,
    /// Time blocked by the agent
    Blocked,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::LeadVisit => write!(f, "lead_visit"),
            AppointmentType::Standalone => write!(f, "standalone"),
            AppointmentType::Blocked => write!(f, "blocked"),
        }
    }
}

impl AppointmentType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lead_visit" => Some(AppointmentType::LeadVisit),
            "standalone" => Some(AppointmentType::Standalone),
            "blocked" => Some(AppointmentType::Blocked),
            _ => None,
        }
    }
}

/// Appointment status
///
/// Any status may be overwritten by any other; there is no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

impl AppointmentStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Whether an appointment in this status still blocks the agent's calendar
    pub fn occupies_time(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

/// Appointment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub lead_service_id: Option<Uuid>,
    pub appointment_type: AppointmentType,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub all_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a scheduled appointment with a fresh identifier
    pub fn new(
        organization_id: Uuid,
        user_id: Uuid,
        appointment_type: AppointmentType,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            lead_id: None,
            lead_service_id: None,
            appointment_type,
            title: title.into(),
            description: None,
            location: None,
            start_time,
            end_time,
            status: AppointmentStatus::Scheduled,
            all_day: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Half-open overlap test: touching boundaries do not overlap
    #[inline]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && end > self.start_time
    }

    /// Whether this appointment blocks the agent's calendar
    pub fn occupies_time(&self) -> bool {
        self.status.occupies_time()
    }
}

/// Input for booking an appointment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAppointment {
    /// Agent the appointment is booked for; defaults to the caller
    pub user_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub lead_service_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    /// Send a visit invite to the lead's consumer contact
    #[serde(default)]
    pub send_confirmation: bool,
}

/// Partial update of an appointment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
}

impl AppointmentPatch {
    /// Apply the present fields to an appointment
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(title) = &self.title {
            appointment.title = title.clone();
        }
        if let Some(description) = &self.description {
            appointment.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            appointment.location = Some(location.clone());
        }
        if let Some(start_time) = self.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            appointment.end_time = end_time;
        }
        if let Some(all_day) = self.all_day {
            appointment.all_day = all_day;
        }
    }
}

/// Filters for listing appointments
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub user_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    /// Appointments starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Appointments starting before this instant
    pub to: Option<DateTime<Utc>>,
}

/// Appointment together with its denormalized lead contact
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadContactSummary>,
}

/// Compact appointment listing row
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
}

impl From<&AppointmentDetails> for AppointmentSummary {
    fn from(details: &AppointmentDetails) -> Self {
        let a = &details.appointment;
        Self {
            id: a.id,
            start_time: a.start_time,
            end_time: a.end_time,
            title: a.title.clone(),
            status: a.status,
            appointment_type: a.appointment_type,
            lead: details.lead.as_ref().map(LeadContactSummary::display),
        }
    }
}

/// Candidate booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Slots of a single calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}
