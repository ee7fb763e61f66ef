//! JWT Claims structure
//!
//! Defines the claims carried by identity tokens issued to agents and admins.

use booking_core::models::{Caller, UserRole};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,

    /// Organization the user belongs to
    pub org_id: Uuid,

    /// User role
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user of an organization
    ///
    /// The expiration is left unset and filled in by `JwtService::create_token`.
    ///
    /// # Examples
    ///
    /// ```
    /// use booking_auth::Claims;
    /// use booking_core::models::UserRole;
    /// use uuid::Uuid;
    ///
    /// let user = Uuid::new_v4();
    /// let claims = Claims::new(user, Uuid::new_v4(), UserRole::Admin);
    /// assert_eq!(claims.sub, user);
    /// assert!(claims.is_admin());
    /// ```
    pub fn new(user_id: Uuid, organization_id: Uuid, role: UserRole) -> Self {
        Self {
            sub: user_id,
            org_id: organization_id,
            role,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create new claims with custom expiration duration
    pub fn with_expiration(
        user_id: Uuid,
        organization_id: Uuid,
        role: UserRole,
        expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            org_id: organization_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Identity handed to the services
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.sub,
            organization_id: self.org_id,
            is_admin: self.is_admin(),
        }
    }
}
