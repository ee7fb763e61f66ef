//! Booking Engine Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the availability and appointment-booking engine. It includes:
//!
//! - Domain models (AvailabilityRule, AvailabilityOverride, Appointment, Slot)
//! - Repository and collaborator traits (stores, LeadAssigner, Notifier)
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
