//! User roles and caller identity
//!
//! Users themselves live in the identity provider; the engine only sees the
//! role and ids carried by the caller's token.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Field agent managing their own calendar
    #[default]
    Agent,
    /// Organization administrator with access to every agent's calendar
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Agent => write!(f, "agent"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "agent" => Some(UserRole::Agent),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Check if role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Resolved identity of whoever invokes a service operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub is_admin: bool,
}

impl Caller {
    /// Caller acting as a regular agent
    pub fn agent(user_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id,
            is_admin: false,
        }
    }

    /// Caller acting as an organization administrator
    pub fn admin(user_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id,
            is_admin: true,
        }
    }
}
