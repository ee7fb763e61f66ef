//! Booking Engine Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the booking engine. It includes:
//!
//! - Connection pool management with sqlx
//! - Embedded schema migrations
//! - Repository implementations for rules, overrides and appointments
//! - Lead ownership and contact lookups against the lead-management schema

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use booking_core::{AppError, AppResult};
pub use sqlx::PgPool;
