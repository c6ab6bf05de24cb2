//! HTTP request handlers

pub mod admin;
pub mod dashboard;
pub mod health;
pub mod history;
pub mod integration;
pub mod preferences;
pub mod realtime;
pub mod session;
pub mod ws;

pub use admin::configure as configure_admin;
pub use dashboard::configure as configure_dashboard;
pub use health::configure as configure_health;
pub use history::configure as configure_history;
pub use integration::configure as configure_integration;
pub use preferences::configure as configure_preferences;
pub use realtime::configure as configure_realtime;
pub use session::configure as configure_session;
pub use ws::ws_handler;

use crate::state::AppState;
use actix_web::web;
use inout_auth::AuthenticatedUser;
use inout_core::{
    models::{DisplayPreferences, ExternalConnection, UserControl},
    traits::ExternalProject,
    AppError, AppResult,
};
use std::sync::Arc;

/// Register every `/api/v1` route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health)
        .configure(configure_session)
        .configure(configure_integration)
        .configure(configure_preferences)
        .configure(configure_dashboard)
        .configure(configure_history)
        .configure(configure_admin)
        .configure(configure_realtime);
}

/// Control row of the caller, created on first access
pub(crate) async fn user_control(state: &AppState, user: &AuthenticatedUser) -> AppResult<UserControl> {
    let email = user.email.as_deref().unwrap_or_default();
    state.user_control.ensure(user.user_id, email).await
}

/// The caller's control row, failing unless they may use the app
pub(crate) async fn require_access(state: &AppState, user: &AuthenticatedUser) -> AppResult<UserControl> {
    let control = user_control(state, user).await?;
    if !control.can_access_app() {
        return Err(AppError::PendingApproval);
    }
    Ok(control)
}

/// The caller's control row, failing unless they are an admin
pub(crate) async fn require_admin(state: &AppState, user: &AuthenticatedUser) -> AppResult<UserControl> {
    let control = user_control(state, user).await?;
    if !control.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(control)
}

/// Client for the caller's project plus the lead table
pub(crate) async fn connected_project(
    state: &AppState,
    user: &AuthenticatedUser,
) -> AppResult<(Arc<dyn ExternalProject>, ExternalConnection)> {
    let integration = state
        .integrations
        .find_by_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::IntegrationNotConfigured("no integration saved".to_string()))?;

    let connection = integration.connection()?;
    let project = state.projects.connect(&connection.credentials)?;
    Ok((project, connection))
}

/// Client for the caller's project; no table needed
pub(crate) async fn project_client(
    state: &AppState,
    user: &AuthenticatedUser,
) -> AppResult<Arc<dyn ExternalProject>> {
    let integration = state
        .integrations
        .find_by_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::IntegrationNotConfigured("no integration saved".to_string()))?;

    state.projects.connect(&integration.credentials()?)
}

/// Stored preferences, defaults when never saved
pub(crate) async fn display_preferences(
    state: &AppState,
    user: &AuthenticatedUser,
) -> AppResult<DisplayPreferences> {
    Ok(state
        .preferences
        .find_by_user(user.user_id)
        .await?
        .unwrap_or_default())
}
