//! Caller identity for the booking engine
//!
//! This crate validates the identity tokens issued to agents and admins and
//! exposes the caller to Actix-web handlers.
//!
//! # Features
//!
//! - JWT token creation and validation
//! - Request extractor producing the authenticated `Caller`
//!
//! # Examples
//!
//! ## Creating a JWT token
//!
//! ```no_run
//! use booking_auth::JwtService;
//! use booking_core::models::UserRole;
//! use uuid::Uuid;
//!
//! let jwt_service = JwtService::new("your-secret-key", 1800);
//! let token = jwt_service.create_token_for_user(Uuid::new_v4(), Uuid::new_v4(), UserRole::Agent)?;
//! # Ok::<(), booking_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::AuthenticatedUser;
