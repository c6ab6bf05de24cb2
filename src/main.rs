//! Inout Metrics Backend Server
//!
//! Serves the lead-metrics dashboard: per-user integrations with an external
//! project, period metrics and reports, conversation history and a live
//! WebSocket feed driven by change webhooks.

use actix_cors::Cors;
use actix_web::{error::InternalError, http::header, middleware, web, App, HttpResponse, HttpServer};
use inout_api::{configure_routes, ws_handler, AppState};
use inout_auth::JwtService;
use inout_core::AppConfig;
use inout_db::{
    create_pool, run_migrations, PgIntegrationRepository, PgPreferencesRepository,
    PgUserControlRepository,
};
use inout_external::RestClientFactory;
use inout_services::{ChangeHub, DashboardService, HistoryService};
use std::env;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "inout_metrics={lvl},inout_api={lvl},inout_services={lvl},inout_external={lvl},inout_db={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Bad request body for malformed JSON or query strings
fn bad_request(code: &'static str, err: impl std::fmt::Display) -> actix_web::Error {
    let message = err.to_string();
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": code,
            "message": message,
            "status": 400,
        })),
    )
    .into()
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Inout Metrics v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(|e| io::Error::other(format!("configuration: {}", e)))?;
    let tz = config
        .dashboard
        .tz()
        .map_err(|e| io::Error::other(e.to_string()))?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    let projects = RestClientFactory::new(&config.external).map_err(|e| io::Error::other(e.to_string()))?;

    let state = AppState {
        integrations: Arc::new(PgIntegrationRepository::new(pool.clone())),
        preferences: Arc::new(PgPreferencesRepository::new(pool.clone())),
        user_control: Arc::new(PgUserControlRepository::new(pool.clone())),
        projects: Arc::new(projects),
        dashboard: Arc::new(DashboardService::new(tz, config.dashboard.max_rows)),
        history: Arc::new(HistoryService::new(&config.dashboard, tz)),
        hub: Arc::new(ChangeHub::new(config.realtime.channel_capacity)),
        external: config.external.clone(),
        realtime: config.realtime.clone(),
        tz,
    };

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.audience.clone(),
    ));

    if config.realtime.webhook_secret.is_none() {
        info!("No webhook secret configured; change webhooks are disabled");
    }

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();

    info!(
        timezone = %tz,
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let origins: Vec<String> = cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        let cors = Cors::default()
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
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request("invalid_json", err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request("invalid_query", err)))
            .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request("invalid_path", err)))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .service(web::scope("/api/v1").configure(configure_routes))
            // WebSocket endpoint for live dashboard updates
            .route("/ws", web::get().to(ws_handler))
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
