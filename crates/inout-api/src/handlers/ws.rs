//! WebSocket handler for live dashboard updates
//!
//! A session watches one table of the user's project. Change notifications
//! for that table and explicit refreshes from the client reload the
//! dashboard for the session's current period and push a `metrics_update`.

use crate::dto::PeriodParams;
use crate::handlers::{connected_project, display_preferences, require_access};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, Session};
use async_trait::async_trait;
use futures::StreamExt;
use inout_auth::AuthenticatedUser;
use inout_core::models::{DisplayPreferences, Period};
use inout_core::{AppError, AppResult};
use inout_services::{
    ChannelKey, DashboardView, DashboardViewer, LiveRefresher, RefreshOutcome, RefreshTrigger,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Messages sent by the browser
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Switch the watched period
    Subscribe(PeriodParams),
    /// Reload now
    Refresh,
    Ping,
}

/// Messages pushed to the browser
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    MetricsUpdate(Box<DashboardView>),
    Subscribed { table: String, period: Period },
    Error { message: String },
    Pong,
}

/// The signed-in user behind a session, re-checked on every load
struct SessionViewer {
    state: web::Data<AppState>,
    user: AuthenticatedUser,
}

#[async_trait]
impl DashboardViewer for SessionViewer {
    async fn preferences(&self) -> AppResult<DisplayPreferences> {
        require_access(&self.state, &self.user).await?;
        display_preferences(&self.state, &self.user).await
    }
}

/// Serialize and send; false once the peer is gone
async fn send(session: &mut Session, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => session.text(json).await.is_ok(),
        Err(e) => {
            error!(error = %e, "Failed to serialize WebSocket message");
            true
        }
    }
}

/// Message for a finished load, and whether the session must end
fn outcome_message(outcome: RefreshOutcome) -> (ServerMessage, bool) {
    match outcome.result {
        Ok(view) => (ServerMessage::MetricsUpdate(Box::new(view)), false),
        Err(e) => {
            warn!(seq = outcome.seq, error = %e, "Dashboard refresh failed");
            let revoked = matches!(e, AppError::PendingApproval | AppError::Forbidden);
            (
                ServerMessage::Error {
                    message: e.to_string(),
                },
                revoked,
            )
        }
    }
}

/// WebSocket connection handler
///
/// GET /ws?access_token=...&period=7days
pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PeriodParams>,
) -> Result<HttpResponse, actix_web::Error> {
    require_access(&state, &user).await?;
    let selection = query.selection()?;
    let (project, connection) = connected_project(&state, &user).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;

    let channel = ChannelKey::new(
        connection.credentials.project_host(),
        connection.table.as_str(),
    );
    info!(user_id = %user.user_id, channel = %channel, "WebSocket connection established");

    let user_id = user.user_id;
    let viewer = Arc::new(SessionViewer {
        state: state.clone(),
        user,
    });
    let (live, results) = LiveRefresher::new(
        state.dashboard.clone(),
        project,
        connection.table,
        viewer,
        selection,
    );

    actix_web::rt::spawn(ws_session(
        session,
        msg_stream,
        state,
        live,
        results,
        channel,
        user_id,
    ));

    Ok(response)
}

/// Handle WebSocket session
async fn ws_session(
    mut session: Session,
    mut msg_stream: actix_ws::MessageStream,
    state: web::Data<AppState>,
    live: LiveRefresher,
    mut results: UnboundedReceiver<RefreshOutcome>,
    channel: ChannelKey,
    user_id: Uuid,
) {
    let mut changes = state.hub.subscribe(&channel);
    let ping_secs = state.realtime.ping_interval_secs.max(1);
    let mut ping_interval = interval(Duration::from_secs(ping_secs));

    live.request(RefreshTrigger::Connect);

    loop {
        tokio::select! {
            Some(msg) = msg_stream.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Subscribe(params)) => match params.selection() {
                                Ok(selection) => {
                                    let ack = ServerMessage::Subscribed {
                                        table: channel.table.clone(),
                                        period: selection.period,
                                    };
                                    if !send(&mut session, &ack).await {
                                        break;
                                    }
                                    live.subscribe(selection);
                                }
                                Err(e) => {
                                    let msg = ServerMessage::Error { message: e.to_string() };
                                    if !send(&mut session, &msg).await {
                                        break;
                                    }
                                }
                            },
                            Ok(ClientMessage::Refresh) => live.request(RefreshTrigger::Client),
                            Ok(ClientMessage::Ping) => {
                                if !send(&mut session, &ServerMessage::Pong).await {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(user_id = %user_id, error = %e, "Ignoring unknown client message");
                            }
                        }
                    }
                    Ok(Message::Ping(bytes)) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(reason)) => {
                        info!(user_id = %user_id, "Client closed connection: {:?}", reason);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(user_id = %user_id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }

            Some(outcome) = results.recv() => {
                let (msg, revoked) = outcome_message(outcome);
                if !send(&mut session, &msg).await || revoked {
                    if revoked {
                        info!(user_id = %user_id, "Access revoked, closing connection");
                    }
                    break;
                }
            }

            change = changes.recv() => {
                match change {
                    Ok(event) => {
                        debug!(channel = %event.channel, kind = %event.kind, "Change notification");
                        live.request(RefreshTrigger::Change);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(missed, "Change notifications coalesced");
                        live.request(RefreshTrigger::Change);
                    }
                    Err(RecvError::Closed) => {
                        changes = state.hub.subscribe(&channel);
                    }
                }
            }

            _ = ping_interval.tick() => {
                if session.ping(b"").await.is_err() {
                    warn!(user_id = %user_id, "Failed to send ping, closing connection");
                    break;
                }
            }
        }
    }

    live.stop();
    info!(user_id = %user_id, "WebSocket connection closed");
    let _ = session.close(None).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","data":{"period":"30days"}}"#).unwrap();
        match msg {
            ClientMessage::Subscribe(params) => assert_eq!(params.period, Period::Last30Days),
            other => panic!("unexpected {:?}", other),
        }

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"refresh"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Refresh));
    }

    #[test]
    fn test_server_message_shape() {
        let json = serde_json::to_value(ServerMessage::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["data"]["message"], "boom");

        let json = serde_json::to_value(ServerMessage::Pong).unwrap();
        assert_eq!(json["type"], "pong");
    }

    #[test]
    fn test_revoked_access_ends_the_session() {
        let (msg, revoked) = outcome_message(RefreshOutcome {
            seq: 3,
            result: Err(AppError::PendingApproval),
        });
        assert!(revoked);
        assert!(matches!(msg, ServerMessage::Error { .. }));

        let (_, revoked) = outcome_message(RefreshOutcome {
            seq: 4,
            result: Err(AppError::ExternalConnection("timed out".to_string())),
        });
        assert!(!revoked);
    }
}
