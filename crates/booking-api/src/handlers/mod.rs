//! HTTP request handlers

pub mod appointment;
pub mod availability;
pub mod portal;

use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;

pub use appointment::configure as configure_appointments;
pub use availability::configure as configure_availability;
pub use portal::configure as configure_portal;

/// Health check endpoint
///
/// GET /api/v1/health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "booking-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Mount every API route under `/api/v1`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_availability)
            .configure(configure_appointments)
            .configure(configure_portal),
    );
}

/// Query extractor config answering malformed query strings with JSON 400s
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let error_message = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({
                "error": "invalid_query",
                "message": error_message,
                "status": 400,
            })),
        )
        .into()
    })
}

/// JSON body extractor config answering malformed bodies with JSON 400s
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let error_message = err.to_string();
            InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(json!({
                    "error": "invalid_body",
                    "message": error_message,
                    "status": 400,
                })),
            )
            .into()
        })
}

/// Path extractor config answering malformed ids with JSON 400s
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let error_message = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({
                "error": "invalid_path",
                "message": error_message,
                "status": 400,
            })),
        )
        .into()
    })
}
