//! Availability models
//!
//! Recurring weekly rules and date-specific overrides that together describe
//! when an agent can be booked.

use crate::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurring weekly availability window of an agent
///
/// `weekday` counts from Sunday (0) to Saturday (6). Times of day are wall-clock
/// times interpreted in `timezone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityRule {
    /// Create a new rule with a fresh identifier
    pub fn new(
        organization_id: Uuid,
        user_id: Uuid,
        weekday: i16,
        start_time: NaiveTime,
        end_time: NaiveTime,
        timezone: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            weekday,
            start_time,
            end_time,
            timezone: timezone.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the rule invariants (weekday range, start before end)
    pub fn validate(&self) -> AppResult<()> {
        validate_weekday(self.weekday)?;
        validate_window(self.start_time, self.end_time)
    }
}

/// Input for creating a rule, as received from the caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAvailabilityRule {
    /// Agent the rule belongs to; defaults to the caller
    pub user_id: Option<Uuid>,
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
    pub timezone: Option<String>,
}

/// Partial update of a rule
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityRulePatch {
    pub weekday: Option<i16>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
}

/// Date-specific exception to the weekly rules
///
/// When `is_available` is false the whole date is blocked. When it is true,
/// `start_time`/`end_time` (if present) replace every rule for that date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub is_available: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityOverride {
    /// Create a new override with a fresh identifier
    pub fn new(
        organization_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        is_available: bool,
        window: Option<(NaiveTime, NaiveTime)>,
        timezone: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            date,
            is_available,
            start_time: window.map(|(start, _)| start),
            end_time: window.map(|(_, end)| end),
            timezone: timezone.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Custom window replacing the rules, if this override opens the date with one
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        if !self.is_available {
            return None;
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Input for creating (upserting) an override
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAvailabilityOverride {
    /// Agent the override belongs to; defaults to the caller
    pub user_id: Option<Uuid>,
    pub date: String,
    pub is_available: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
}

// ==================== Parsing helpers ====================

/// Parse a wall-clock time in `HH:MM` or `HH:MM:SS` form
pub fn parse_time_of_day(field: &str, value: &str) -> AppResult<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| {
            AppError::Validation(format!(
                "{} must be a time of day in HH:MM format, got '{}'",
                field, value
            ))
        })
}

/// Parse a calendar date in `YYYY-MM-DD` form
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "{} must be a date in YYYY-MM-DD format, got '{}'",
            field, value
        ))
    })
}

/// Validate an explicitly supplied IANA timezone name
pub fn validate_timezone(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    trimmed
        .parse::<Tz>()
        .map(|_| trimmed.to_string())
        .map_err(|_| AppError::Validation(format!("Unknown timezone '{}'", name)))
}

/// Resolve an optional timezone, falling back to the organizational default
pub fn timezone_or_default(name: Option<&str>, default_timezone: &str) -> AppResult<String> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => validate_timezone(n),
        None => Ok(default_timezone.to_string()),
    }
}

/// `start < end`
pub fn validate_window(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if start >= end {
        return Err(AppError::Validation(format!(
            "start_time ({}) must be before end_time ({})",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }
    Ok(())
}

/// Weekday must be within 0 (Sunday) ..= 6 (Saturday)
pub fn validate_weekday(weekday: i16) -> AppResult<()> {
    if !(0..=6).contains(&weekday) {
        return Err(AppError::Validation(format!(
            "weekday must be between 0 (Sunday) and 6 (Saturday), got {}",
            weekday
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("start_time", "09:00").unwrap(), t(9, 0));
        assert_eq!(parse_time_of_day("start_time", "17:30:00").unwrap(), t(17, 30));
        assert_eq!(parse_time_of_day("start_time", " 08:15 ").unwrap(), t(8, 15));
        assert!(parse_time_of_day("start_time", "25:00").is_err());
        assert!(parse_time_of_day("start_time", "nine").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2026-03-02").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert!(parse_date("date", "2026-02-30").is_err());
        assert!(parse_date("date", "02/03/2026").is_err());
    }

    #[test]
    fn test_timezone_validation() {
        assert_eq!(validate_timezone("Europe/Amsterdam").unwrap(), "Europe/Amsterdam");
        assert!(validate_timezone("Mars/Olympus").is_err());
        assert_eq!(timezone_or_default(None, "UTC").unwrap(), "UTC");
        assert_eq!(timezone_or_default(Some("  "), "UTC").unwrap(), "UTC");
        assert_eq!(
            timezone_or_default(Some("America/New_York"), "UTC").unwrap(),
            "America/New_York"
        );
    }

    #[test]
    fn test_window_validation() {
        assert!(validate_window(t(9, 0), t(12, 0)).is_ok());
        assert!(validate_window(t(12, 0), t(12, 0)).is_err());
        assert!(validate_window(t(13, 0), t(12, 0)).is_err());
    }

    #[test]
    fn test_rule_validate() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let rule = AvailabilityRule::new(org, user, 1, t(9, 0), t(12, 0), "UTC");
        assert!(rule.validate().is_ok());

        let bad = AvailabilityRule::new(org, user, 7, t(9, 0), t(12, 0), "UTC");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_override_window() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let open = AvailabilityOverride::new(org, user, date, true, Some((t(10, 0), t(14, 0))), "UTC");
        assert_eq!(open.window(), Some((t(10, 0), t(14, 0))));

        let blocked = AvailabilityOverride::new(org, user, date, false, Some((t(10, 0), t(14, 0))), "UTC");
        assert_eq!(blocked.window(), None);

        let open_no_window = AvailabilityOverride::new(org, user, date, true, None, "UTC");
        assert_eq!(open_no_window.window(), None);
    }
}
