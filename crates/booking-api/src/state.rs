//! Service wiring
//!
//! Handlers are written against the services over trait objects, so the
//! same routes run on the PostgreSQL stores in production and on the
//! in-memory stores in tests.

use actix_web::web;
use booking_core::config::SchedulingConfig;
use booking_core::traits::{
    AppointmentRepository, LeadAssigner, LeadDirectory, Notifier, OverrideRepository,
    RuleRepository,
};
use booking_services::{AvailabilityService, BookingService, PortalService};
use std::sync::Arc;
use tracing::info;

/// Availability service as seen by the handlers
pub type AvailabilityApi =
    AvailabilityService<dyn RuleRepository, dyn OverrideRepository, dyn AppointmentRepository>;

/// Booking service as seen by the handlers
pub type BookingApi =
    BookingService<dyn AppointmentRepository, dyn LeadAssigner, dyn LeadDirectory, dyn Notifier>;

/// Portal service as seen by the handlers
pub type PortalApi = PortalService<
    dyn RuleRepository,
    dyn OverrideRepository,
    dyn AppointmentRepository,
    dyn LeadAssigner,
    dyn LeadDirectory,
    dyn Notifier,
>;

/// Storage and collaborator implementations the services are built on
pub struct Stores {
    pub rules: Arc<dyn RuleRepository>,
    pub overrides: Arc<dyn OverrideRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub lead_assigner: Arc<dyn LeadAssigner>,
    pub lead_directory: Arc<dyn LeadDirectory>,
    pub notifier: Arc<dyn Notifier>,
}

/// Shared service handles registered as app data on every worker
#[derive(Clone)]
pub struct AppServices {
    pub availability: web::Data<AvailabilityApi>,
    pub booking: web::Data<BookingApi>,
    pub portal: web::Data<PortalApi>,
}

impl AppServices {
    /// Build the services over `stores`
    pub fn build(stores: Stores, scheduling: &SchedulingConfig) -> Self {
        let availability: Arc<AvailabilityApi> = Arc::new(AvailabilityService::new(
            stores.rules,
            stores.overrides,
            Arc::clone(&stores.appointments),
            scheduling.default_timezone.clone(),
        ));

        let booking: Arc<BookingApi> = Arc::new(
            BookingService::new(
                stores.appointments,
                Arc::clone(&stores.lead_assigner),
                stores.lead_directory,
                stores.notifier,
            )
            .with_double_booking_guard(scheduling.prevent_double_booking),
        );

        let portal: Arc<PortalApi> = Arc::new(PortalService::new(
            Arc::clone(&availability),
            Arc::clone(&booking),
            stores.lead_assigner,
        ));

        info!(
            "Scheduling services ready (default timezone {}, double-booking guard {})",
            scheduling.default_timezone,
            if scheduling.prevent_double_booking { "on" } else { "off" }
        );

        Self {
            availability: web::Data::from(availability),
            booking: web::Data::from(booking),
            portal: web::Data::from(portal),
        }
    }

    /// Register the services as app data
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.availability.clone())
            .app_data(self.booking.clone())
            .app_data(self.portal.clone());
    }
}
