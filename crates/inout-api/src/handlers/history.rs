//! Conversation history and agent handlers
//!
//! Everything here reads or edits the user's external project; the tables
//! come from configuration.

use crate::dto::{
    AgentPromptRequest, AgentSettingsResponse, ApiResponse, DisableAgentResponse,
    MessageResponse, PeriodParams, SessionsQuery, SessionsResponse,
};
use crate::handlers::{project_client, require_access};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use inout_auth::AuthenticatedUser;
use inout_core::AppError;
use tracing::{info, instrument};
use validator::Validate;

/// Chat sessions of the period, most recent first
///
/// GET /api/v1/history/sessions
#[instrument(skip(state, user, query), fields(user_id = %user.user_id))]
pub async fn list_sessions(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<SessionsQuery>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let selection = query.period.selection()?;
    let project = project_client(&state, &user).await?;

    let sessions = state
        .history
        .sessions(project.as_ref(), &selection, query.search.as_deref(), Utc::now())
        .await?;

    let total = sessions.len();
    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionsResponse { sessions, total })))
}

/// Messages of one session
///
/// GET /api/v1/history/sessions/{session_id}/messages
#[instrument(skip(state, user, query), fields(user_id = %user.user_id))]
pub async fn list_messages(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<PeriodParams>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let selection = query.selection()?;
    let project = project_client(&state, &user).await?;

    let messages = state
        .history
        .messages(project.as_ref(), &path, &selection, Utc::now())
        .await?;

    let response: Vec<MessageResponse> = messages.iter().map(MessageResponse::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Switch the agent off for a lead
///
/// POST /api/v1/history/leads/{cliente_id}/disable-agent
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn disable_agent(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let cliente_id = path.into_inner();
    let project = project_client(&state, &user).await?;
    let updated_rows = state.history.disable_agent(project.as_ref(), &cliente_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        DisableAgentResponse {
            cliente_id,
            updated_rows,
        },
        "Agente desativado",
    )))
}

/// GET /api/v1/agent-settings
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_agent_settings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;

    let project = project_client(&state, &user).await?;
    let settings = state.history.agent_settings(project.as_ref()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(AgentSettingsResponse::from(settings))))
}

/// Replace the agent prompt
///
/// PUT /api/v1/agent-settings
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn update_agent_settings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<AgentPromptRequest>,
) -> Result<HttpResponse, AppError> {
    require_access(&state, &user).await?;
    req.validate()?;

    let project = project_client(&state, &user).await?;
    let settings = state
        .history
        .update_agent_prompt(project.as_ref(), &req.agent_prompt)
        .await?;

    info!("Agent settings updated");
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        AgentSettingsResponse::from(settings),
        "Prompt atualizado",
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/history")
            .route("/sessions", web::get().to(list_sessions))
            .route("/sessions/{session_id}/messages", web::get().to(list_messages))
            .route(
                "/leads/{cliente_id}/disable-agent",
                web::post().to(disable_agent),
            ),
    )
    .service(
        web::scope("/agent-settings")
            .route("", web::get().to(get_agent_settings))
            .route("", web::put().to(update_agent_settings)),
    );
}
