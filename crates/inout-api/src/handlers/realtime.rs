//! Change webhook receiver
//!
//! The external project posts row changes here; they are fanned out to the
//! WebSocket sessions watching that project's table. The path names the
//! project by its host, the same host saved in the user's integration.

use crate::dto::{validate_project_host, validate_table_name, ApiResponse};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use inout_core::AppError;
use inout_services::{ChangeEvent, ChannelKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Header carrying the shared webhook secret
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Database webhook body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// `INSERT`, `UPDATE` or `DELETE`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAccepted {
    pub project: String,
    pub table: String,
    pub delivered: usize,
}

/// Byte comparison that does not stop at the first mismatch
fn secrets_match(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Receive a row change for `table` of `project`
///
/// POST /api/v1/realtime/{project}/{table}
#[instrument(skip(state, req, payload))]
pub async fn receive_change(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    payload: web::Json<WebhookPayload>,
) -> Result<HttpResponse, AppError> {
    let expected = state
        .realtime
        .webhook_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("webhooks are disabled".to_string()))?;

    let given = req
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if !secrets_match(expected, given) {
        warn!("Webhook rejected: bad secret");
        return Err(AppError::Unauthorized("invalid webhook secret".to_string()));
    }

    let (project, table) = path.into_inner();
    let project = project.to_ascii_lowercase();
    validate_project_host(&project)?;
    validate_table_name(&table)?;

    let payload = payload.into_inner();
    let delivered = state.hub.publish(ChangeEvent {
        channel: ChannelKey::new(project.as_str(), table.as_str()),
        kind: payload.kind.to_ascii_uppercase(),
        record: payload.record.or(payload.old_record),
        received_at: Utc::now(),
    });

    debug!(project = %project, table = %table, delivered, "Change webhook accepted");
    Ok(HttpResponse::Accepted().json(ApiResponse::success(WebhookAccepted {
        project,
        table,
        delivered,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/realtime/{project}/{table}", web::post().to(receive_change));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3creT"));
        assert!(!secrets_match("s3cret", "s3cret!"));
        assert!(!secrets_match("s3cret", ""));
    }

    #[test]
    fn test_payload_shape() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "type": "DELETE",
            "table": "leads",
            "schema": "public",
            "record": null,
            "old_record": {"id": 1}
        }))
        .unwrap();
        assert_eq!(payload.kind, "DELETE");
        assert!(payload.record.is_none());
        assert!(payload.old_record.is_some());
    }
}
