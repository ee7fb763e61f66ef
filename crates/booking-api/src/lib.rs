//! API layer for the booking engine
//!
//! HTTP handlers for availability management, slot queries, appointments
//! and the consumer portal.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;
pub mod state;

// Re-export DTOs (common types)
pub use dto::ApiResponse;

// Re-export handler configuration functions
pub use handlers::{
    configure_api, configure_appointments, configure_availability, configure_portal, json_config,
    path_config, query_config,
};
pub use state::{AppServices, AvailabilityApi, BookingApi, PortalApi, Stores};
