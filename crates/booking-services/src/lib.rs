//! Business logic services for the booking engine
//!
//! This crate contains the scheduling logic that sits between the HTTP layer
//! and the stores: availability management, slot generation, appointment
//! booking and the consumer-facing portal.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies behind repository traits
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//!
//! # Services
//!
//! - `AvailabilityService` - Weekly rules, date overrides and slot queries
//! - `BookingService` - Appointment lifecycle and lead auto-claiming
//! - `PortalService` - Lead-scoped availability and visit requests
//! - `AuthorizationGuard` - Ownership checks shared by all of the above

pub mod authorization;
pub mod availability;
pub mod booking;
pub mod notifier;
pub mod portal;
pub mod slot_generator;

pub use authorization::AuthorizationGuard;
pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use notifier::LogNotifier;
pub use portal::{PortalService, VisitRequest};
pub use slot_generator::{generate_slots, SlotQuery};

/// Business logic constants
pub mod constants {
    /// Slot length used when a query does not give one
    pub const DEFAULT_SLOT_MINUTES: i64 = 60;

    /// Longest date range (inclusive) a slot query may span
    pub const MAX_RANGE_DAYS: i64 = 14;

    /// Days of appointments fetched on each side of a slot query
    pub const APPOINTMENT_FETCH_PADDING_DAYS: i64 = 1;

    /// Days of availability offered on the consumer portal
    pub const PORTAL_HORIZON_DAYS: i64 = 14;

    /// Title given to visits requested through the portal
    pub const PORTAL_VISIT_TITLE: &str = "Visit";
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;
