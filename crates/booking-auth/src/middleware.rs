//! Actix-web request extractor for the calling user
//!
//! Resolves the bearer token (or `token` cookie) into the `Caller` the
//! services authorize against.

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use booking_core::error::AppError;
use booking_core::models::Caller;
use futures::future::{ready, Ready};
use tracing::{debug, error};
use uuid::Uuid;

/// Extract JWT token from request
///
/// Checks for token in the following order:
/// 1. Authorization header (Bearer token)
/// 2. Cookie named "token"
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    req.cookie("token").map(|cookie| cookie.value().to_string())
}

/// Authenticated user extractor
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use booking_auth::AuthenticatedUser;
///
/// async fn protected_handler(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({
///         "user_id": user.user_id(),
///         "admin": user.is_admin()
///     }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.claims.sub
    }

    pub fn organization_id(&self) -> Uuid {
        self.claims.org_id
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    /// Identity handed to the services
    pub fn caller(&self) -> Caller {
        self.claims.caller()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(jwt_service) = req.app_data::<web::Data<JwtService>>() else {
            error!("JwtService not found in app data");
            return ready(Err(AppError::Internal(
                "Authentication service not configured".to_string(),
            )
            .into()));
        };

        let Some(token) = extract_token_from_request(req) else {
            debug!("No authentication token found in request");
            return ready(Err(AppError::Unauthorized(
                "No authentication token provided".to_string(),
            )
            .into()));
        };

        match jwt_service.validate_token(&token) {
            Ok(claims) => {
                debug!(
                    user_id = %claims.sub,
                    org_id = %claims.org_id,
                    role = %claims.role,
                    "User authenticated"
                );
                ready(Ok(AuthenticatedUser { claims }))
            }
            Err(e) => ready(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{cookie::Cookie, test, App, HttpResponse};
    use booking_core::models::UserRole;

    fn create_test_jwt_service() -> JwtService {
        JwtService::new("test-secret-key-12345", 3600)
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "user_id": user.user_id(),
            "admin": user.is_admin(),
        }))
    }

    #[actix_web::test]
    async fn test_bearer_token() {
        let jwt_service = create_test_jwt_service();
        let user = Uuid::new_v4();
        let token = jwt_service
            .create_token_for_user(user, Uuid::new_v4(), UserRole::Admin)
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user_id"], user.to_string());
        assert_eq!(body["admin"], true);
    }

    #[actix_web::test]
    async fn test_cookie_token() {
        let jwt_service = create_test_jwt_service();
        let token = jwt_service
            .create_token_for_user(Uuid::new_v4(), Uuid::new_v4(), UserRole::Agent)
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new("token", token))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_missing_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(create_test_jwt_service()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_invalid_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(create_test_jwt_service()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer invalid.token.here"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }
}
