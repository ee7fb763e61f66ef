//! Availability DTOs
//!
//! Request and response types for weekly rules, date overrides and the
//! slot query.

use booking_core::models::{
    AvailabilityOverride, AvailabilityRule, AvailabilityRulePatch, NewAvailabilityOverride,
    NewAvailabilityRule,
};
use booking_services::constants::DEFAULT_SLOT_MINUTES;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const TIME_FORMAT: &str = "%H:%M";

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

// ==================== Rules ====================

/// Weekly rule creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRuleRequest {
    /// Agent the rule is for (admins only; defaults to the caller)
    pub user_id: Option<Uuid>,

    /// Day of week, 0 = Sunday
    #[validate(range(min = 0, max = 6, message = "weekday must be between 0 (Sunday) and 6"))]
    pub weekday: i16,

    /// Local start time, "HH:MM"
    #[validate(length(min = 1, message = "start_time is required"))]
    pub start_time: String,

    /// Local end time, "HH:MM"
    #[validate(length(min = 1, message = "end_time is required"))]
    pub end_time: String,

    /// IANA timezone; the configured default when omitted
    pub timezone: Option<String>,
}

impl From<CreateRuleRequest> for NewAvailabilityRule {
    fn from(req: CreateRuleRequest) -> Self {
        Self {
            user_id: req.user_id,
            weekday: req.weekday,
            start_time: req.start_time,
            end_time: req.end_time,
            timezone: req.timezone,
        }
    }
}

/// Weekly rule update request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRuleRequest {
    #[validate(range(min = 0, max = 6, message = "weekday must be between 0 (Sunday) and 6"))]
    pub weekday: Option<i16>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
}

impl From<UpdateRuleRequest> for AvailabilityRulePatch {
    fn from(req: UpdateRuleRequest) -> Self {
        Self {
            weekday: req.weekday,
            start_time: req.start_time,
            end_time: req.end_time,
            timezone: req.timezone,
        }
    }
}

/// Weekly rule response
#[derive(Debug, Clone, Serialize)]
pub struct RuleResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AvailabilityRule> for RuleResponse {
    fn from(rule: AvailabilityRule) -> Self {
        Self {
            id: rule.id,
            user_id: rule.user_id,
            weekday: rule.weekday,
            start_time: format_time(rule.start_time),
            end_time: format_time(rule.end_time),
            timezone: rule.timezone,
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

// ==================== Overrides ====================

/// Override creation request; replaces any override of the same date
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOverrideRequest {
    pub user_id: Option<Uuid>,

    /// Calendar date, "YYYY-MM-DD"
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,

    /// `false` blocks the whole date
    pub is_available: bool,

    /// Custom window replacing the weekly rules; both or neither
    pub start_time: Option<String>,
    pub end_time: Option<String>,

    pub timezone: Option<String>,
}

impl From<CreateOverrideRequest> for NewAvailabilityOverride {
    fn from(req: CreateOverrideRequest) -> Self {
        Self {
            user_id: req.user_id,
            date: req.date,
            is_available: req.is_available,
            start_time: req.start_time,
            end_time: req.end_time,
            timezone: req.timezone,
        }
    }
}

/// Override response
#[derive(Debug, Clone, Serialize)]
pub struct OverrideResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AvailabilityOverride> for OverrideResponse {
    fn from(o: AvailabilityOverride) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            date: o.date,
            is_available: o.is_available,
            start_time: o.start_time.map(format_time),
            end_time: o.end_time.map(format_time),
            timezone: o.timezone,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// ==================== Queries ====================

/// `?user_id=` scope of rule listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserScopeQuery {
    pub user_id: Option<Uuid>,
}

/// Override listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverrideListQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Slot query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SlotsQuery {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Slot length in minutes; absent or non-positive means 60
    #[validate(range(max = 1440, message = "slot_duration must be at most 1440 minutes"))]
    pub slot_duration: Option<i64>,
}

impl SlotsQuery {
    /// Requested slot length, falling back to the default
    pub fn minutes(&self) -> i64 {
        match self.slot_duration {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_SLOT_MINUTES,
        }
    }
}
