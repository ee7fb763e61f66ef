//! JWT token creation and validation service
//!
//! Identity tokens are issued by the identity provider with a shared secret;
//! this service validates them and can mint tokens for tooling and tests.

use crate::claims::Claims;
use booking_core::error::AppError;
use booking_core::models::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// JWT Service for token creation and validation
#[derive(Clone)]
pub struct JwtService {
    /// Default token expiration time in seconds
    expiration_secs: i64,

    /// Encoding key (cached)
    encoding_key: EncodingKey,

    /// Decoding key (cached)
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    ///
    /// # Examples
    ///
    /// ```
    /// use booking_auth::JwtService;
    ///
    /// let jwt_service = JwtService::new("my-secret-key", 1800);
    /// ```
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            expiration_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a JWT token from claims
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if token creation fails
    pub fn create_token(&self, claims: &Claims) -> Result<String, AppError> {
        let mut token_claims = claims.clone();

        if token_claims.exp == 0 {
            let exp = Utc::now() + Duration::seconds(self.expiration_secs);
            token_claims.exp = exp.timestamp();
        }

        debug!(
            user_id = %token_claims.sub,
            role = %token_claims.role,
            exp = %token_claims.exp,
            "Creating JWT token"
        );

        encode(&Header::default(), &token_claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to create JWT token");
            AppError::InvalidToken(format!("Token creation failed: {}", e))
        })
    }

    /// Create a token for a user of an organization
    pub fn create_token_for_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.create_token(&Claims::new(user_id, organization_id, role))
    }

    /// Validate a JWT token and extract claims
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AppError::TokenExpired` if the token has expired
    /// - `AppError::InvalidToken` if the token is invalid
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                warn!("Token expired");
                return AppError::TokenExpired;
            }

            warn!(error = %e, "Invalid token");
            AppError::InvalidToken(format!("Token validation failed: {}", e))
        })?;

        let claims = token_data.claims;

        debug!(
            user_id = %claims.sub,
            org_id = %claims.org_id,
            role = %claims.role,
            "Token validated successfully"
        );

        Ok(claims)
    }

    /// Get the expiration time for tokens created by this service
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
