//! Access control handlers (admin only)

use crate::dto::{ApiResponse, UserControlResponse, UserListResponse};
use crate::handlers::require_admin;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use inout_auth::AuthenticatedUser;
use inout_core::models::ApprovalStatus;
use inout_core::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Every user with their approval status
///
/// GET /api/v1/admin/users
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_users(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&state, &user).await?;

    let rows = state.user_control.list_all().await?;
    let users: Vec<UserControlResponse> = rows.iter().map(UserControlResponse::from).collect();
    let pending = users
        .iter()
        .filter(|u| u.status == ApprovalStatus::Pending)
        .count();

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserListResponse {
        total: users.len(),
        pending,
        users,
    })))
}

/// POST /api/v1/admin/users/{user_id}/approve
pub async fn approve_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_approval(&state, &user, path.into_inner(), true).await
}

/// POST /api/v1/admin/users/{user_id}/block
pub async fn block_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    set_approval(&state, &user, path.into_inner(), false).await
}

#[instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
async fn set_approval(
    state: &AppState,
    admin: &AuthenticatedUser,
    target: Uuid,
    approved: bool,
) -> Result<HttpResponse, AppError> {
    require_admin(state, admin).await?;

    if target == admin.user_id {
        warn!("Admin tried to change their own approval");
        return Err(AppError::InvalidInput(
            "cannot change your own approval".to_string(),
        ));
    }

    let existing = state
        .user_control
        .find_by_user(target)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", target)))?;

    if existing.is_admin() {
        return Err(AppError::Forbidden);
    }

    let updated = state
        .user_control
        .set_approval(target, approved, &admin.display_name())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", target)))?;

    info!(target = %target, approved, "User approval changed");

    let message = if approved {
        "Usuário aprovado"
    } else {
        "Usuário bloqueado"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        UserControlResponse::from(&updated),
        message,
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/users")
            .route("", web::get().to(list_users))
            .route("/{user_id}/approve", web::post().to(approve_user))
            .route("/{user_id}/block", web::post().to(block_user)),
    );
}
