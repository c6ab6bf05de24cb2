//! Display preference handlers

use crate::dto::ApiResponse;
use crate::handlers::{display_preferences, require_access};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use inout_auth::AuthenticatedUser;
use inout_core::models::PreferencesUpdate;
use inout_core::AppError;
use tracing::{debug, instrument};

/// GET /api/v1/preferences
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_preferences(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;
    let prefs = display_preferences(&state, &user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(prefs)))
}

/// Partial update; omitted toggles keep their value
///
/// PATCH /api/v1/preferences
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn update_preferences(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<PreferencesUpdate>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let merged = display_preferences(&state, &user)
        .await?
        .merge(req.into_inner());
    let saved = state.preferences.upsert(user.user_id, &merged).await?;

    debug!(?saved, "Preferences updated");
    Ok(HttpResponse::Ok().json(ApiResponse::success(saved)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/preferences")
            .route("", web::get().to(get_preferences))
            .route("", web::patch().to(update_preferences)),
    );
}
