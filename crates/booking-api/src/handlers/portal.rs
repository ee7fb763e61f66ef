//! Consumer portal handlers
//!
//! Unauthenticated routes addressed by organization and lead. The portal
//! link is issued and checked by the lead-management system in front of
//! this service.

use crate::dto::portal::{PortalAvailabilityQuery, PortalVisitRequest};
use crate::dto::ApiResponse;
use crate::state::PortalApi;
use actix_web::{web, HttpResponse};
use booking_core::AppError;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Free slots of the lead's agent
///
/// GET /api/v1/portal/{org_id}/leads/{lead_id}/availability
#[instrument(skip(service))]
pub async fn portal_availability(
    service: web::Data<PortalApi>,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<PortalAvailabilityQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Portal availability query validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let (org_id, lead_id) = path.into_inner();
    let days = service
        .availability(
            org_id,
            lead_id,
            query.start_date,
            query.end_date,
            query.minutes(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(days)))
}

/// Request a visit in one of the offered slots
///
/// POST /api/v1/portal/{org_id}/leads/{lead_id}/visits
#[instrument(skip(service, req))]
pub async fn request_visit(
    service: web::Data<PortalApi>,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<PortalVisitRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Portal visit validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let (org_id, lead_id) = path.into_inner();
    let appointment = service
        .request_visit(org_id, lead_id, req.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        appointment,
        "Visit requested",
    )))
}

/// Configure portal routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/portal/{org_id}/leads/{lead_id}")
            .route("/availability", web::get().to(portal_availability))
            .route("/visits", web::post().to(request_visit)),
    );
}
