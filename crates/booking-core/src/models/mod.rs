//! Domain models for the booking engine
//!
//! This module contains all the core domain models used throughout the application.

pub mod appointment;
pub mod availability;
pub mod lead;
pub mod user;

pub use appointment::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentPatch, AppointmentStatus,
    AppointmentSummary, AppointmentType, DaySlots, NewAppointment, Slot,
};
pub use availability::{
    AvailabilityOverride, AvailabilityRule, AvailabilityRulePatch, NewAvailabilityOverride,
    NewAvailabilityRule,
};
pub use lead::{ConsumerContact, LeadContactSummary};
pub use user::{Caller, UserRole};
