//! Integration handlers
//!
//! Setup flow for the user's external project: test the credentials, list
//! the tables, then save the chosen table.

use crate::dto::{
    ApiResponse, ConnectionTestResponse, CredentialsRequest, IntegrationRequest,
    IntegrationResponse, TablesResponse, TABLES_HINT,
};
use crate::handlers::require_access;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use inout_auth::AuthenticatedUser;
use inout_core::AppError;
use tracing::{info, instrument, warn};

/// Saved integration, masked
///
/// GET /api/v1/integration
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_integration(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let integration = state
        .integrations
        .find_by_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::IntegrationNotConfigured("no integration saved".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(IntegrationResponse::from(&integration))))
}

/// Create or replace the integration
///
/// PUT /api/v1/integration
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn save_integration(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<IntegrationRequest>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let upsert = req.to_upsert(&state.external.allowed_host_suffixes)?;
    let integration = state.integrations.upsert(user.user_id, &upsert).await?;

    info!(
        project_url = %integration.project_url,
        table = ?integration.selected_table,
        "Integration saved"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        IntegrationResponse::from(&integration),
        "Integração salva",
    )))
}

/// Remove the integration
///
/// DELETE /api/v1/integration
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_integration(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    if !state.integrations.delete_by_user(user.user_id).await? {
        return Err(AppError::NotFound("no integration saved".to_string()));
    }

    info!("Integration deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Check the credentials against the project
///
/// POST /api/v1/integration/test
///
/// An unreachable project is reported in the body, not as an HTTP error.
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn test_connection(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let credentials = req.credentials(&state.external.allowed_host_suffixes)?;
    let project = state.projects.connect(&credentials)?;

    let response = match project.test_connection().await {
        Ok(()) => ConnectionTestResponse {
            success: true,
            error: None,
        },
        Err(e) => {
            warn!(project_url = %credentials.project_url, error = %e, "Connection test failed");
            ConnectionTestResponse {
                success: false,
                error: Some(e.to_string()),
            }
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Tables of the project, with a hint when they cannot be listed
///
/// POST /api/v1/integration/tables
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn list_tables(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let credentials = req.credentials(&state.external.allowed_host_suffixes)?;
    let project = state.projects.connect(&credentials)?;

    let tables = match project.list_tables().await {
        Ok(tables) => tables,
        Err(e) => {
            warn!(error = %e, "Could not list tables");
            Vec::new()
        }
    };

    let hint = tables.is_empty().then(|| TABLES_HINT.to_string());
    Ok(HttpResponse::Ok().json(ApiResponse::success(TablesResponse { tables, hint })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/integration")
            .route("", web::get().to(get_integration))
            .route("", web::put().to(save_integration))
            .route("", web::delete().to(delete_integration))
            .route("/test", web::post().to(test_connection))
            .route("/tables", web::post().to(list_tables)),
    );
}
