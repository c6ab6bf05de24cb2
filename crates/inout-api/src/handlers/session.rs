//! Session handler
//!
//! Tells the client who is signed in and which screen comes next.

use crate::dto::{ApiResponse, SessionResponse};
use crate::handlers::user_control;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use inout_auth::AuthenticatedUser;
use inout_core::AppError;
use tracing::{debug, instrument};

/// Current user, approval status and next destination
///
/// GET /api/v1/session
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let control = user_control(&state, &user).await?;
    let integration = state.integrations.find_by_user(user.user_id).await?;

    let response = SessionResponse::new(&control, integration.as_ref());
    debug!(next = ?response.next, "Session resolved");

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/session", web::get().to(get_session));
}
