//! Booking engine server
//!
//! Serves availability management, slot queries, appointment booking and
//! the consumer portal over HTTP.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use booking_api::{configure_api, json_config, path_config, query_config, AppServices, Stores};
use booking_auth::JwtService;
use booking_core::AppConfig;
use booking_db::{
    create_pool, run_migrations, PgAppointmentRepository, PgLeadRepository, PgOverrideRepository,
    PgRuleRepository,
};
use booking_services::LogNotifier;
use std::env;
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins; otherwise `LOG_LEVEL` applies to the workspace crates.
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "booking_engine={0},booking_api={0},booking_services={0},booking_db={0},booking_auth={0},booking::notifications=info,actix_web=info,sqlx=warn",
            log_level
        ))
    });

    let json = env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

fn build_cors(origins: Arc<Vec<String>>) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| origins.iter().any(|allowed| allowed == o))
                .unwrap_or(false)
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::COOKIE,
        ])
        .supports_credentials()
        .max_age(3600)
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting booking engine v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .map_err(|e| startup_error("Failed to apply migrations", e))?;
    } else {
        info!("Skipping migrations (database.run_migrations is off)");
    }

    let leads = Arc::new(PgLeadRepository::new(pool.clone()));
    let stores = Stores {
        rules: Arc::new(PgRuleRepository::new(pool.clone())),
        overrides: Arc::new(PgOverrideRepository::new(pool.clone())),
        appointments: Arc::new(PgAppointmentRepository::new(pool.clone())),
        lead_assigner: leads.clone(),
        lead_directory: leads,
        notifier: Arc::new(LogNotifier::new()),
    };
    let services = AppServices::build(stores, &config.scheduling);

    if config.auth.jwt_secret.len() < 32 {
        warn!("JWT secret is shorter than 32 bytes");
    }
    let jwt_service = web::Data::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));

    let origins = Arc::new(config.cors.origins());
    info!("CORS allowed origins: {:?}", origins);

    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(jwt_service.clone())
            .app_data(query_config())
            .app_data(json_config())
            .app_data(path_config())
            .configure(|cfg| services.register(cfg))
            // Middleware
            .wrap(build_cors(Arc::clone(&origins)))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_api)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
