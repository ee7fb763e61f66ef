//! Slot generation
//!
//! Derives bookable slots for one agent from weekly rules, date overrides and
//! the agent's existing appointments. Generation is a pure function of its
//! inputs and does no I/O.
//!
//! Per calendar date:
//! 1. An override for the date wins over every rule. A blocking override, or
//!    an open override without a window, yields no slots. An open override
//!    with a window contributes exactly that window.
//! 2. Otherwise every rule for the date's weekday contributes its window.
//! 3. Windows are anchored in their own timezone and compared in UTC.
//! 4. Windows are cut into back-to-back slots that must fit entirely.
//! 5. Slots overlapping a live appointment of the agent are dropped.

use booking_core::{
    models::{Appointment, AvailabilityOverride, AvailabilityRule, DaySlots, Slot},
    AppError, AppResult,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{DEFAULT_SLOT_MINUTES, MAX_RANGE_DAYS};

/// Parameters of a slot query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Slot length; values <= 0 fall back to the default
    pub slot_duration_minutes: i64,
}

impl SlotQuery {
    /// Effective slot duration after applying the default
    pub fn slot_duration(&self) -> Duration {
        let minutes = if self.slot_duration_minutes <= 0 {
            DEFAULT_SLOT_MINUTES
        } else {
            self.slot_duration_minutes
        };
        Duration::minutes(minutes)
    }

    /// Reject inverted ranges and ranges longer than the allowed maximum
    pub fn validate(&self) -> AppResult<()> {
        if self.end_date < self.start_date {
            return Err(AppError::Validation(format!(
                "end_date ({}) must not be before start_date ({})",
                self.end_date, self.start_date
            )));
        }
        if (self.end_date - self.start_date).num_days() > MAX_RANGE_DAYS {
            return Err(AppError::RangeTooLarge {
                max_days: MAX_RANGE_DAYS,
            });
        }
        Ok(())
    }

    /// Every calendar date of the query, inclusive on both ends
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }
}

/// Generate the slots of `query.user_id` for every date of the query range
///
/// Rules, overrides and appointments belonging to other agents are ignored,
/// as are cancelled appointments. Every date of the range is present in the
/// output, in order, even when it has no slots.
pub fn generate_slots(
    query: &SlotQuery,
    rules: &[AvailabilityRule],
    overrides: &[AvailabilityOverride],
    appointments: &[Appointment],
) -> AppResult<Vec<DaySlots>> {
    query.validate()?;

    let duration = query.slot_duration();

    let overrides_by_date: HashMap<NaiveDate, &AvailabilityOverride> = overrides
        .iter()
        .filter(|o| o.user_id == query.user_id)
        .map(|o| (o.date, o))
        .collect();

    let busy: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.user_id == query.user_id && a.occupies_time())
        .collect();

    let days = query
        .dates()
        .map(|date| {
            let date_override = overrides_by_date.get(&date).copied();
            let windows = windows_for_date(query.user_id, date, rules, date_override);
            let slots = slots_for_windows(&windows, duration, &busy);
            DaySlots { date, slots }
        })
        .collect::<Vec<_>>();

    debug!(
        user_id = %query.user_id,
        days = days.len(),
        slots = days.iter().map(|d| d.slots.len()).sum::<usize>(),
        "Generated slots"
    );

    Ok(days)
}

/// Resolve a stored timezone name, degrading to UTC when it is not recognised
pub fn resolve_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        warn!(timezone = %name, "Unrecognised timezone, falling back to UTC");
        Tz::UTC
    })
}

/// Anchor a wall-clock time on `date` in `tz` and convert it to UTC
///
/// Ambiguous local times (DST fall-back) resolve to the earliest instant.
/// Non-existent local times (DST spring-forward gap) are shifted one hour
/// forward.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let local = date.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// A wall-clock window anchored on one calendar date
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalWindow<'a> {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    timezone: &'a str,
}

impl LocalWindow<'_> {
    /// Absolute UTC bounds of the window
    fn resolve(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tz = resolve_timezone(self.timezone);
        let start = local_to_utc(tz, self.date, self.start)?;
        let end = local_to_utc(tz, self.date, self.end)?;
        (start < end).then_some((start, end))
    }
}

fn windows_for_date<'a>(
    user_id: Uuid,
    date: NaiveDate,
    rules: &'a [AvailabilityRule],
    date_override: Option<&'a AvailabilityOverride>,
) -> Vec<LocalWindow<'a>> {
    if let Some(o) = date_override {
        // Blocked, or open without a window: nothing to schedule on this date.
        return o
            .window()
            .map(|(start, end)| LocalWindow {
                date,
                start,
                end,
                timezone: o.timezone.as_str(),
            })
            .into_iter()
            .collect();
    }

    let weekday = date.weekday().num_days_from_sunday() as i16;
    rules
        .iter()
        .filter(|r| r.user_id == user_id && r.weekday == weekday)
        .map(|r| LocalWindow {
            date,
            start: r.start_time,
            end: r.end_time,
            timezone: r.timezone.as_str(),
        })
        .collect()
}

fn slots_for_windows(
    windows: &[LocalWindow<'_>],
    duration: Duration,
    busy: &[&Appointment],
) -> Vec<Slot> {
    let mut slots = Vec::new();

    for window in windows {
        let Some((window_start, window_end)) = window.resolve() else {
            continue;
        };

        let mut slot_start = window_start;
        loop {
            let slot_end = slot_start + duration;
            if slot_end > window_end {
                break;
            }
            if !busy.iter().any(|a| a.overlaps(slot_start, slot_end)) {
                slots.push(Slot {
                    start_time: slot_start,
                    end_time: slot_end,
                });
            }
            slot_start = slot_end;
        }
    }

    slots.sort();

    // Overlapping rule windows yield overlapping candidates; keep the earliest.
    let mut kept: Vec<Slot> = Vec::with_capacity(slots.len());
    for slot in slots {
        match kept.last() {
            Some(last) if slot.start_time < last.end_time => {}
            _ => kept.push(slot),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_core::models::{AppointmentStatus, AppointmentType};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn utc(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(t(h, m)))
    }

    /// 2026-03-02 is a Monday
    fn monday() -> NaiveDate {
        d(2026, 3, 2)
    }

    struct Fixture {
        org: Uuid,
        user: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                org: Uuid::new_v4(),
                user: Uuid::new_v4(),
            }
        }

        fn query(&self, start: NaiveDate, end: NaiveDate, minutes: i64) -> SlotQuery {
            SlotQuery {
                user_id: self.user,
                start_date: start,
                end_date: end,
                slot_duration_minutes: minutes,
            }
        }

        fn rule(&self, weekday: i16, start: NaiveTime, end: NaiveTime, tz: &str) -> AvailabilityRule {
            AvailabilityRule::new(self.org, self.user, weekday, start, end, tz)
        }

        fn appointment(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Appointment {
            Appointment::new(self.org, self.user, AppointmentType::Standalone, "Busy", start, end)
        }

        fn blocked_day(&self, date: NaiveDate) -> AvailabilityOverride {
            AvailabilityOverride::new(self.org, self.user, date, false, None, "UTC")
        }
    }

    fn starts(day: &DaySlots) -> Vec<DateTime<Utc>> {
        day.slots.iter().map(|s| s.start_time).collect()
    }

    #[test]
    fn test_monday_rule_yields_three_hourly_slots() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(12, 0), "UTC")];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(
            days[0].slots,
            vec![
                Slot { start_time: utc(monday(), 9, 0), end_time: utc(monday(), 10, 0) },
                Slot { start_time: utc(monday(), 10, 0), end_time: utc(monday(), 11, 0) },
                Slot { start_time: utc(monday(), 11, 0), end_time: utc(monday(), 12, 0) },
            ]
        );
    }

    #[test]
    fn test_existing_appointment_removes_overlapping_slot() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(12, 0), "UTC")];
        let appts = vec![f.appointment(utc(monday(), 10, 0), utc(monday(), 11, 0))];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &appts).unwrap();

        assert_eq!(starts(&days[0]), vec![utc(monday(), 9, 0), utc(monday(), 11, 0)]);
    }

    #[test]
    fn test_unavailable_override_blocks_the_day() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(12, 0), "UTC")];
        let overrides = vec![f.blocked_day(monday())];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &overrides, &[]).unwrap();

        assert_eq!(days.len(), 1);
        assert!(days[0].slots.is_empty());
    }

    #[test]
    fn test_custom_window_override_replaces_rules() {
        let f = Fixture::new();
        let rules = vec![
            f.rule(1, t(9, 0), t(12, 0), "UTC"),
            f.rule(1, t(13, 0), t(17, 0), "UTC"),
        ];
        let overrides = vec![AvailabilityOverride::new(
            f.org,
            f.user,
            monday(),
            true,
            Some((t(18, 0), t(20, 0))),
            "UTC",
        )];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &overrides, &[]).unwrap();

        assert_eq!(starts(&days[0]), vec![utc(monday(), 18, 0), utc(monday(), 19, 0)]);
    }

    #[test]
    fn test_open_override_without_window_yields_nothing() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(12, 0), "UTC")];
        let overrides = vec![AvailabilityOverride::new(f.org, f.user, monday(), true, None, "UTC")];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &overrides, &[]).unwrap();

        assert!(days[0].slots.is_empty());
    }

    #[test]
    fn test_override_only_affects_its_own_date() {
        let f = Fixture::new();
        let next_monday = monday() + Duration::days(7);
        let rules = vec![f.rule(1, t(9, 0), t(10, 0), "UTC")];
        let overrides = vec![f.blocked_day(monday())];

        let days = generate_slots(&f.query(monday(), next_monday, 60), &rules, &overrides, &[]).unwrap();

        assert_eq!(days.len(), 8);
        assert!(days[0].slots.is_empty());
        assert_eq!(starts(&days[7]), vec![utc(next_monday, 9, 0)]);
    }

    #[test]
    fn test_window_is_anchored_in_rule_timezone() {
        let f = Fixture::new();
        // Amsterdam is UTC+1 in early March.
        let rules = vec![f.rule(1, t(9, 0), t(11, 0), "Europe/Amsterdam")];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();

        assert_eq!(starts(&days[0]), vec![utc(monday(), 8, 0), utc(monday(), 9, 0)]);
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(10, 0), "Nowhere/Special")];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();

        assert_eq!(starts(&days[0]), vec![utc(monday(), 9, 0)]);
    }

    #[test]
    fn test_partial_trailing_slot_is_dropped() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(10, 30), "UTC")];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();

        assert_eq!(starts(&days[0]), vec![utc(monday(), 9, 0)]);
    }

    #[test]
    fn test_non_positive_duration_defaults_to_an_hour() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(11, 0), "UTC")];

        for minutes in [0, -15] {
            let days = generate_slots(&f.query(monday(), monday(), minutes), &rules, &[], &[]).unwrap();
            assert_eq!(days[0].slots.len(), 2);
            assert!(days[0]
                .slots
                .iter()
                .all(|s| s.end_time - s.start_time == Duration::minutes(60)));
        }
    }

    #[test]
    fn test_every_slot_has_requested_duration() {
        let f = Fixture::new();
        let rules = vec![
            f.rule(1, t(8, 0), t(12, 0), "UTC"),
            f.rule(2, t(13, 15), t(18, 0), "Europe/Amsterdam"),
        ];
        let days = generate_slots(
            &f.query(monday(), monday() + Duration::days(1), 45),
            &rules,
            &[],
            &[],
        )
        .unwrap();

        let all: Vec<&Slot> = days.iter().flat_map(|d| d.slots.iter()).collect();
        assert!(!all.is_empty());
        assert!(all.iter().all(|s| s.end_time - s.start_time == Duration::minutes(45)));
    }

    #[test]
    fn test_overlapping_rules_do_not_produce_overlapping_slots() {
        let f = Fixture::new();
        let rules = vec![
            f.rule(1, t(9, 0), t(12, 0), "UTC"),
            f.rule(1, t(10, 30), t(13, 0), "UTC"),
            f.rule(1, t(9, 0), t(12, 0), "UTC"),
        ];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();
        let slots = &days[0].slots;

        for pair in slots.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
        assert_eq!(slots.first().unwrap().start_time, utc(monday(), 9, 0));
    }

    #[test]
    fn test_slots_sorted_across_windows() {
        let f = Fixture::new();
        let rules = vec![
            f.rule(1, t(14, 0), t(16, 0), "UTC"),
            f.rule(1, t(9, 0), t(10, 0), "UTC"),
        ];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &[]).unwrap();

        assert_eq!(
            starts(&days[0]),
            vec![utc(monday(), 9, 0), utc(monday(), 14, 0), utc(monday(), 15, 0)]
        );
    }

    #[test]
    fn test_touching_appointment_does_not_block() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(11, 0), "UTC")];
        let appts = vec![
            f.appointment(utc(monday(), 8, 0), utc(monday(), 9, 0)),
            f.appointment(utc(monday(), 11, 0), utc(monday(), 12, 0)),
        ];

        let days = generate_slots(&f.query(monday(), monday(), 60), &rules, &[], &appts).unwrap();

        assert_eq!(days[0].slots.len(), 2);
    }

    #[test]
    fn test_cancelled_and_foreign_appointments_are_ignored() {
        let f = Fixture::new();
        let rules = vec![f.rule(1, t(9, 0), t(11, 0), "UTC")];

        let mut cancelled = f.appointment(utc(monday(), 9, 0), utc(monday(), 10, 0));
        cancelled.status = AppointmentStatus::Cancelled;
        let mut someone_else = f.appointment(utc(monday(), 10, 0), utc(monday(), 11, 0));
        someone_else.user_id = Uuid::new_v4();

        let days = generate_slots(
            &f.query(monday(), monday(), 60),
            &rules,
            &[],
            &[cancelled, someone_else],
        )
        .unwrap();

        assert_eq!(days[0].slots.len(), 2);
    }

    #[test]
    fn test_rules_of_other_agents_are_ignored() {
        let f = Fixture::new();
        let mut foreign = f.rule(1, t(9, 0), t(12, 0), "UTC");
        foreign.user_id = Uuid::new_v4();

        let days = generate_slots(&f.query(monday(), monday(), 60), &[foreign], &[], &[]).unwrap();

        assert!(days[0].slots.is_empty());
    }

    #[test]
    fn test_range_limits() {
        let f = Fixture::new();

        let ok = generate_slots(&f.query(monday(), monday() + Duration::days(14), 60), &[], &[], &[]);
        assert_eq!(ok.unwrap().len(), 15);

        let too_large = generate_slots(&f.query(monday(), monday() + Duration::days(15), 60), &[], &[], &[]);
        assert!(matches!(too_large, Err(AppError::RangeTooLarge { max_days: 14 })));

        let inverted = generate_slots(&f.query(monday(), monday() - Duration::days(1), 60), &[], &[], &[]);
        assert!(matches!(inverted, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let f = Fixture::new();
        let rules = vec![
            f.rule(1, t(9, 0), t(12, 0), "Europe/Amsterdam"),
            f.rule(3, t(10, 0), t(16, 0), "America/New_York"),
            f.rule(5, t(7, 30), t(9, 0), "UTC"),
        ];
        let appts = vec![f.appointment(utc(monday(), 9, 0), utc(monday(), 9, 30))];
        let query = f.query(monday(), monday() + Duration::days(13), 30);

        let first = generate_slots(&query, &rules, &[], &appts).unwrap();
        let second = generate_slots(&query, &rules, &[], &appts).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_dst_gap_is_shifted_forward() {
        // Europe/Amsterdam springs forward on 2026-03-29 at 02:00 local.
        let tz = resolve_timezone("Europe/Amsterdam");
        let date = d(2026, 3, 29);

        let shifted = local_to_utc(tz, date, t(2, 30)).unwrap();
        assert_eq!(shifted, utc(date, 1, 30));

        let regular = local_to_utc(tz, date, t(9, 0)).unwrap();
        assert_eq!(regular, utc(date, 7, 0));
    }

    #[test]
    fn test_dst_ambiguity_resolves_to_earliest() {
        // Europe/Amsterdam falls back on 2026-10-25 at 03:00 local.
        let tz = resolve_timezone("Europe/Amsterdam");
        let date = d(2026, 10, 25);

        let earliest = local_to_utc(tz, date, t(2, 30)).unwrap();
        assert_eq!(earliest, utc(date, 0, 30));
    }
}
