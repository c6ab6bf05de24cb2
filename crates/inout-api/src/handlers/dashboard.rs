//! Dashboard handlers
//!
//! Metrics for a period and the downloadable report.

use crate::dto::{ApiResponse, ExportQuery, PeriodParams};
use crate::handlers::{connected_project, display_preferences, require_access};
use crate::state::AppState;
use actix_web::{http::header, web, HttpResponse};
use chrono::Utc;
use inout_auth::AuthenticatedUser;
use inout_core::AppError;
use tracing::{info, instrument};

/// Metrics, funnel and summaries for the selected period
///
/// GET /api/v1/dashboard/metrics
#[instrument(skip(state, user, query), fields(user_id = %user.user_id, period = query.period.as_str()))]
pub async fn get_metrics(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PeriodParams>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let selection = query.selection()?;
    let (project, connection) = connected_project(&state, &user).await?;
    let prefs = display_preferences(&state, &user).await?;

    let view = state
        .dashboard
        .load(project.as_ref(), &connection.table, &selection, &prefs, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

/// Report for the selected period as XLSX (default) or CSV
///
/// GET /api/v1/dashboard/export
#[instrument(skip(state, user, query), fields(user_id = %user.user_id, format = ?query.format))]
pub async fn export_report(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let selection = query.period.selection()?;
    let (project, connection) = connected_project(&state, &user).await?;
    let prefs = display_preferences(&state, &user).await?;

    let file = state
        .dashboard
        .export(
            project.as_ref(),
            &connection.table,
            &selection,
            &prefs,
            query.format,
            Utc::now(),
        )
        .await?;

    info!(file = %file.file_name, bytes = file.bytes.len(), "Sending report");

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ))
        .body(file.bytes))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("/metrics", web::get().to(get_metrics))
            .route("/export", web::get().to(export_report)),
    );
}
