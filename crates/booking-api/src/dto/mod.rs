//! Data Transfer Objects (DTOs) for API requests and responses

pub mod appointment;
pub mod availability;
pub mod common;
pub mod portal;

pub use appointment::*;
pub use availability::*;
pub use common::*;
pub use portal::*;
