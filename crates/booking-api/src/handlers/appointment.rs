//! Appointment handlers
//!
//! HTTP handlers for booking and managing appointments.

use crate::dto::appointment::{
    AppointmentListQuery, CreateAppointmentRequest, UpdateAppointmentRequest, UpdateStatusRequest,
};
use crate::dto::ApiResponse;
use crate::state::BookingApi;
use actix_web::{web, HttpResponse};
use booking_auth::AuthenticatedUser;
use booking_core::models::AppointmentSummary;
use booking_core::AppError;
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Book an appointment
///
/// POST /api/v1/appointments
#[instrument(skip(service, user, req))]
pub async fn create_appointment(
    service: web::Data<BookingApi>,
    user: AuthenticatedUser,
    req: web::Json<CreateAppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Appointment validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = service
        .create(&user.caller(), req.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        created,
        "Appointment booked",
    )))
}

/// List appointments as compact summaries
///
/// GET /api/v1/appointments?user_id=&lead_id=&type=&status=&from=&to=
#[instrument(skip(service, user))]
pub async fn list_appointments(
    service: web::Data<BookingApi>,
    query: web::Query<AppointmentListQuery>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let appointments = service
        .list(&user.caller(), query.into_inner().into())
        .await?;

    let summaries: Vec<AppointmentSummary> =
        appointments.iter().map(AppointmentSummary::from).collect();
    debug!(count = summaries.len(), "Listed appointments");

    Ok(HttpResponse::Ok().json(ApiResponse::success(summaries)))
}

/// Get one appointment with its lead contact
///
/// GET /api/v1/appointments/{id}
#[instrument(skip(service, user))]
pub async fn get_appointment(
    service: web::Data<BookingApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let details = service.get_by_id(&user.caller(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(details)))
}

/// Update an appointment
///
/// PUT /api/v1/appointments/{id}
#[instrument(skip(service, user, req))]
pub async fn update_appointment(
    service: web::Data<BookingApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<UpdateAppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Appointment update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let updated = service
        .update(&user.caller(), path.into_inner(), req.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        updated,
        "Appointment updated",
    )))
}

/// Overwrite the status of an appointment
///
/// PATCH /api/v1/appointments/{id}/status
#[instrument(skip(service, user, req))]
pub async fn update_status(
    service: web::Data<BookingApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let updated = service
        .update_status(&user.caller(), path.into_inner(), req.status)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

/// Delete an appointment
///
/// DELETE /api/v1/appointments/{id}
#[instrument(skip(service, user))]
pub async fn delete_appointment(
    service: web::Data<BookingApi>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    service.delete(&user.caller(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure appointment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appointments")
            .route("", web::get().to(list_appointments))
            .route("", web::post().to(create_appointment))
            .route("/{id}", web::get().to(get_appointment))
            .route("/{id}", web::put().to(update_appointment))
            .route("/{id}", web::delete().to(delete_appointment))
            .route("/{id}/status", web::patch().to(update_status)),
    );
}
