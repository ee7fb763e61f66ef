//! Repository implementations
//!
//! This module contains concrete implementations of the repository and
//! collaborator traits defined in booking-core, using sqlx for PostgreSQL access.

pub mod appointment_repo;
pub mod lead_repo;
pub mod override_repo;
pub mod rule_repo;

pub use appointment_repo::PgAppointmentRepository;
pub use lead_repo::PgLeadRepository;
pub use override_repo::PgOverrideRepository;
pub use rule_repo::PgRuleRepository;
