//! Availability management service
//!
//! CRUD for weekly rules and date overrides, and the slot query that feeds
//! the stored availability into the slot generator.

use booking_core::{
    models::{
        availability::{
            parse_date, parse_time_of_day, timezone_or_default, validate_timezone,
            validate_weekday, validate_window,
        },
        AvailabilityOverride, AvailabilityRule, AvailabilityRulePatch, Caller, DaySlots,
        NewAvailabilityOverride, NewAvailabilityRule,
    },
    traits::{AppointmentRepository, OverrideRepository, RuleRepository},
    AppError, AppResult,
};
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::authorization::AuthorizationGuard;
use crate::constants::APPOINTMENT_FETCH_PADDING_DAYS;
use crate::slot_generator::{generate_slots, SlotQuery};

/// Availability service
///
/// Owns the rule, override and appointment stores needed to answer slot
/// queries. Rule and override mutations go through the shared ownership check.
pub struct AvailabilityService<R, O, A>
where
    R: RuleRepository + ?Sized,
    O: OverrideRepository + ?Sized,
    A: AppointmentRepository + ?Sized,
{
    rule_repo: Arc<R>,
    override_repo: Arc<O>,
    appointment_repo: Arc<A>,
    default_timezone: String,
}

impl<R, O, A> AvailabilityService<R, O, A>
where
    R: RuleRepository + ?Sized,
    O: OverrideRepository + ?Sized,
    A: AppointmentRepository + ?Sized,
{
    /// Create a new availability service
    ///
    /// `default_timezone` is applied to rules and overrides created without one.
    pub fn new(
        rule_repo: Arc<R>,
        override_repo: Arc<O>,
        appointment_repo: Arc<A>,
        default_timezone: impl Into<String>,
    ) -> Self {
        Self {
            rule_repo,
            override_repo,
            appointment_repo,
            default_timezone: default_timezone.into(),
        }
    }

    // ==================== Rules ====================

    /// List the weekly rules of the target agent (the caller by default)
    #[instrument(skip(self))]
    pub async fn list_rules(
        &self,
        caller: &Caller,
        target_user_id: Option<Uuid>,
    ) -> AppResult<Vec<AvailabilityRule>> {
        let user_id = AuthorizationGuard::resolve_target_user(caller, target_user_id)?;
        debug!("Listing availability rules for user {}", user_id);

        self.rule_repo
            .list_for_user(user_id, caller.organization_id)
            .await
    }

    /// Create a weekly rule
    #[instrument(skip(self, input))]
    pub async fn create_rule(
        &self,
        caller: &Caller,
        input: NewAvailabilityRule,
    ) -> AppResult<AvailabilityRule> {
        let user_id = AuthorizationGuard::resolve_target_user(caller, input.user_id)?;

        validate_weekday(input.weekday)?;
        let start = parse_time_of_day("start_time", &input.start_time)?;
        let end = parse_time_of_day("end_time", &input.end_time)?;
        validate_window(start, end)?;
        let timezone = timezone_or_default(input.timezone.as_deref(), &self.default_timezone)?;

        let rule = AvailabilityRule::new(
            caller.organization_id,
            user_id,
            input.weekday,
            start,
            end,
            timezone,
        );
        let created = self.rule_repo.create(&rule).await?;

        info!(
            "Created availability rule {} for user {} (weekday {}, {}-{} {})",
            created.id,
            user_id,
            created.weekday,
            created.start_time.format("%H:%M"),
            created.end_time.format("%H:%M"),
            created.timezone
        );

        Ok(created)
    }

    /// Partially update a weekly rule
    #[instrument(skip(self, patch))]
    pub async fn update_rule(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: AvailabilityRulePatch,
    ) -> AppResult<AvailabilityRule> {
        let mut rule = self.find_rule(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, rule.user_id, "availability rule")?;

        if let Some(weekday) = patch.weekday {
            rule.weekday = weekday;
        }
        if let Some(start) = &patch.start_time {
            rule.start_time = parse_time_of_day("start_time", start)?;
        }
        if let Some(end) = &patch.end_time {
            rule.end_time = parse_time_of_day("end_time", end)?;
        }
        if let Some(timezone) = &patch.timezone {
            rule.timezone = validate_timezone(timezone)?;
        }
        rule.validate()?;

        let updated = self.rule_repo.update(&rule).await?;
        info!("Updated availability rule {}", updated.id);

        Ok(updated)
    }

    /// Delete a weekly rule
    #[instrument(skip(self))]
    pub async fn delete_rule(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let rule = self.find_rule(caller, id).await?;
        AuthorizationGuard::ensure_can_manage(caller, rule.user_id, "availability rule")?;

        if !self.rule_repo.delete(id, caller.organization_id).await? {
            return Err(AppError::RuleNotFound(id.to_string()));
        }

        info!("Deleted availability rule {}", id);
        Ok(())
    }

    async fn find_rule(&self, caller: &Caller, id: Uuid) -> AppResult<AvailabilityRule> {
        self.rule_repo
            .find_by_id(id, caller.organization_id)
            .await?
            .ok_or_else(|| AppError::RuleNotFound(id.to_string()))
    }

    // ==================== Overrides ====================

    /// List the overrides of the target agent within an optional date window
    #[instrument(skip(self))]
    pub async fn list_overrides(
        &self,
        caller: &Caller,
        target_user_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        let user_id = AuthorizationGuard::resolve_target_user(caller, target_user_id)?;
        debug!("Listing availability overrides for user {}", user_id);

        self.override_repo
            .list_for_user(user_id, caller.organization_id, from, to)
            .await
    }

    /// Create or replace the override of a date
    #[instrument(skip(self, input))]
    pub async fn create_override(
        &self,
        caller: &Caller,
        input: NewAvailabilityOverride,
    ) -> AppResult<AvailabilityOverride> {
        let user_id = AuthorizationGuard::resolve_target_user(caller, input.user_id)?;

        let date = parse_date("date", &input.date)?;
        let window = if input.is_available {
            parse_override_window(input.start_time.as_deref(), input.end_time.as_deref())?
        } else {
            None
        };
        let timezone = timezone_or_default(input.timezone.as_deref(), &self.default_timezone)?;

        let entity = AvailabilityOverride::new(
            caller.organization_id,
            user_id,
            date,
            input.is_available,
            window,
            timezone,
        );
        let stored = self.override_repo.upsert(&entity).await?;

        info!(
            "Stored availability override {} for user {} on {} (available: {})",
            stored.id, user_id, stored.date, stored.is_available
        );

        Ok(stored)
    }

    /// Delete an override
    #[instrument(skip(self))]
    pub async fn delete_override(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        let existing = self
            .override_repo
            .find_by_id(id, caller.organization_id)
            .await?
            .ok_or_else(|| AppError::OverrideNotFound(id.to_string()))?;
        AuthorizationGuard::ensure_can_manage(caller, existing.user_id, "availability override")?;

        if !self.override_repo.delete(id, caller.organization_id).await? {
            return Err(AppError::OverrideNotFound(id.to_string()));
        }

        info!("Deleted availability override {}", id);
        Ok(())
    }

    // ==================== Slots ====================

    /// Bookable slots of an agent of the caller's organization
    #[instrument(skip(self))]
    pub async fn get_available_slots(
        &self,
        caller: &Caller,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        slot_duration_minutes: i64,
    ) -> AppResult<Vec<DaySlots>> {
        let query = SlotQuery {
            user_id,
            start_date,
            end_date,
            slot_duration_minutes,
        };
        self.slots_for_agent(caller.organization_id, &query).await
    }

    /// Load the agent's stored availability and generate slots for `query`
    ///
    /// Appointments are fetched with padding on both sides of the range so
    /// that bookings crossing a date boundary in another timezone still count.
    #[instrument(skip(self))]
    pub async fn slots_for_agent(
        &self,
        organization_id: Uuid,
        query: &SlotQuery,
    ) -> AppResult<Vec<DaySlots>> {
        query.validate()?;

        let rules = self
            .rule_repo
            .list_for_user(query.user_id, organization_id)
            .await?;
        let overrides = self
            .override_repo
            .list_for_user(
                query.user_id,
                organization_id,
                Some(query.start_date),
                Some(query.end_date),
            )
            .await?;

        let padding = Duration::days(APPOINTMENT_FETCH_PADDING_DAYS);
        let from = Utc.from_utc_datetime(&(query.start_date - padding).and_time(NaiveTime::MIN));
        let to = Utc.from_utc_datetime(
            &(query.end_date + Duration::days(1) + padding).and_time(NaiveTime::MIN),
        );
        let appointments = self
            .appointment_repo
            .find_occupying(query.user_id, organization_id, from, to)
            .await?;

        debug!(
            "Generating slots for user {} from {} rules, {} overrides, {} appointments",
            query.user_id,
            rules.len(),
            overrides.len(),
            appointments.len()
        );

        generate_slots(query, &rules, &overrides, &appointments)
    }
}

/// Custom window of an open override: both bounds or neither
fn parse_override_window(
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<Option<(NaiveTime, NaiveTime)>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_time_of_day("start_time", start)?;
            let end = parse_time_of_day("end_time", end)?;
            validate_window(start, end)?;
            Ok(Some((start, end)))
        }
        _ => Err(AppError::Validation(
            "start_time and end_time must be given together".to_string(),
        )),
    }
}
