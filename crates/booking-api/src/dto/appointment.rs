//! Appointment DTOs
//!
//! Request and query types for the appointment endpoints. Responses reuse
//! the core `AppointmentDetails` and `AppointmentSummary` shapes.

use booking_core::models::{
    AppointmentFilter, AppointmentPatch, AppointmentStatus, AppointmentType, NewAppointment,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Appointment booking request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    /// Agent to book for (admins only; defaults to the caller)
    pub user_id: Option<Uuid>,

    pub lead_id: Option<Uuid>,
    pub lead_service_id: Option<Uuid>,

    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,

    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(max = 500))]
    pub location: Option<String>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    #[serde(default)]
    pub all_day: bool,

    /// E-mail a visit invite to the lead's consumer
    #[serde(default)]
    pub send_confirmation: bool,
}

impl From<CreateAppointmentRequest> for NewAppointment {
    fn from(req: CreateAppointmentRequest) -> Self {
        Self {
            user_id: req.user_id,
            lead_id: req.lead_id,
            lead_service_id: req.lead_service_id,
            appointment_type: req.appointment_type,
            title: req.title,
            description: req.description,
            location: req.location,
            start_time: req.start_time,
            end_time: req.end_time,
            all_day: req.all_day,
            send_confirmation: req.send_confirmation,
        }
    }
}

/// Appointment update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
}

impl From<UpdateAppointmentRequest> for AppointmentPatch {
    fn from(req: UpdateAppointmentRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            start_time: req.start_time,
            end_time: req.end_time,
            all_day: req.all_day,
        }
    }
}

/// Status overwrite request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Appointment listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    /// Ignored for non-admins, who only see their own appointments
    pub user_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl From<AppointmentListQuery> for AppointmentFilter {
    fn from(query: AppointmentListQuery) -> Self {
        Self {
            user_id: query.user_id,
            lead_id: query.lead_id,
            appointment_type: query.appointment_type,
            status: query.status,
            from: query.from,
            to: query.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateAppointmentRequest = serde_json::from_value(json!({
            "title": "Intake call",
            "start_time": "2026-03-02T09:00:00Z",
            "end_time": "2026-03-02T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(req.appointment_type, AppointmentType::Standalone);
        assert!(!req.send_confirmation);
        assert!(req.validate().is_ok());

        let input = NewAppointment::from(req);
        assert_eq!(input.title, "Intake call");
        assert!(input.user_id.is_none());
    }

    #[test]
    fn test_create_request_rejects_empty_title() {
        let req: CreateAppointmentRequest = serde_json::from_value(json!({
            "type": "lead_visit",
            "title": "",
            "start_time": "2026-03-02T09:00:00Z",
            "end_time": "2026-03-02T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(req.appointment_type, AppointmentType::LeadVisit);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_request_is_closed() {
        let ok: UpdateStatusRequest = serde_json::from_value(json!({ "status": "no_show" })).unwrap();
        assert_eq!(ok.status, AppointmentStatus::NoShow);

        assert!(serde_json::from_value::<UpdateStatusRequest>(json!({ "status": "archived" })).is_err());
    }
}
