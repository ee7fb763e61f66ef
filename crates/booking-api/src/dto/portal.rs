//! Consumer portal DTOs

use booking_services::{constants::DEFAULT_SLOT_MINUTES, VisitRequest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Portal availability query; the window defaults to the portal horizon
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PortalAvailabilityQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(max = 1440, message = "slot_duration must be at most 1440 minutes"))]
    pub slot_duration: Option<i64>,
}

impl PortalAvailabilityQuery {
    pub fn minutes(&self) -> i64 {
        match self.slot_duration {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_SLOT_MINUTES,
        }
    }
}

/// Visit requested by the consumer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PortalVisitRequest {
    pub lead_service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl From<PortalVisitRequest> for VisitRequest {
    fn from(req: PortalVisitRequest) -> Self {
        Self {
            lead_service_id: req.lead_service_id,
            start_time: req.start_time,
            end_time: req.end_time,
            title: req.title,
            description: req.description,
        }
    }
}
