//! Availability handlers
//!
//! HTTP handlers for weekly rules, date overrides and slot queries.

use crate::dto::availability::{
    CreateOverrideRequest, CreateRuleRequest, OverrideListQuery, OverrideResponse, RuleResponse,
    SlotsQuery, UpdateRuleRequest, UserScopeQuery,
};
use crate::dto::ApiResponse;
use crate::state::AvailabilityApi;
use actix_web::{web, HttpResponse};
use booking_auth::AuthenticatedUser;
use booking_core::AppError;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// List weekly rules
///
/// GET /api/v1/availability/rules?user_id=
#[instrument(skip(service, user))]
pub async fn list_rules(
    service: web::Data<AvailabilityApi>,
    query: web::Query<UserScopeQuery>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let rules = service.list_rules(&user.caller(), query.user_id).await?;

    let response: Vec<RuleResponse> = rules.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Create a weekly rule
///
/// POST /api/v1/availability/rules
#[instrument(skip(service, user, req))]
pub async fn create_rule(
    service: web::Data<AvailabilityApi>,
    user: AuthenticatedUser,
    req: web::Json<CreateRuleRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Availability rule validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = service
        .create_rule(&user.caller(), req.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        RuleResponse::from(created),
        "Availability rule created",
    )))
}

/// Update a weekly rule
///
/// PUT /api/v1/availability/rules/{id}
#[instrument(skip(service, user, req))]
pub async fn update_rule(
    service: web::Data<AvailabilityApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<UpdateRuleRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Availability rule update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let updated = service
        .update_rule(&user.caller(), path.into_inner(), req.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        RuleResponse::from(updated),
        "Availability rule updated",
    )))
}

/// Delete a weekly rule
///
/// DELETE /api/v1/availability/rules/{id}
#[instrument(skip(service, user))]
pub async fn delete_rule(
    service: web::Data<AvailabilityApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    service.delete_rule(&user.caller(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List date overrides
///
/// GET /api/v1/availability/overrides?user_id=&from=&to=
#[instrument(skip(service, user))]
pub async fn list_overrides(
    service: web::Data<AvailabilityApi>,
    query: web::Query<OverrideListQuery>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let overrides = service
        .list_overrides(&user.caller(), query.user_id, query.from, query.to)
        .await?;

    let response: Vec<OverrideResponse> = overrides.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Create or replace the override of a date
///
/// POST /api/v1/availability/overrides
#[instrument(skip(service, user, req))]
pub async fn create_override(
    service: web::Data<AvailabilityApi>,
    user: AuthenticatedUser,
    req: web::Json<CreateOverrideRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Availability override validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let stored = service
        .create_override(&user.caller(), req.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        OverrideResponse::from(stored),
        "Availability override stored",
    )))
}

/// Delete a date override
///
/// DELETE /api/v1/availability/overrides/{id}
#[instrument(skip(service, user))]
pub async fn delete_override(
    service: web::Data<AvailabilityApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    service
        .delete_override(&user.caller(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Bookable slots of an agent
///
/// GET /api/v1/availability/slots?user_id=&start_date=&end_date=&slot_duration=
#[instrument(skip(service, user))]
pub async fn get_slots(
    service: web::Data<AvailabilityApi>,
    query: web::Query<SlotsQuery>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Slot query validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        user_id = %query.user_id,
        start_date = %query.start_date,
        end_date = %query.end_date,
        minutes = query.minutes(),
        "Querying available slots"
    );

    let days = service
        .get_available_slots(
            &user.caller(),
            query.user_id,
            query.start_date,
            query.end_date,
            query.minutes(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(days)))
}

/// Configure availability routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/availability")
            .route("/rules", web::get().to(list_rules))
            .route("/rules", web::post().to(create_rule))
            .route("/rules/{id}", web::put().to(update_rule))
            .route("/rules/{id}", web::delete().to(delete_rule))
            .route("/overrides", web::get().to(list_overrides))
            .route("/overrides", web::post().to(create_override))
            .route("/overrides/{id}", web::delete().to(delete_override))
            .route("/slots", web::get().to(get_slots)),
    );
}
