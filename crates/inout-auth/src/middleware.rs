//! Actix-web request extractor for the signed-in user

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use inout_core::error::AppError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Cookie and query parameter carrying the access token
pub const TOKEN_PARAM: &str = "access_token";

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Extract JWT token from request
///
/// Checks for token in the following order:
/// 1. Authorization header (Bearer token)
/// 2. Cookie named `access_token`
/// 3. `access_token` query parameter (browsers cannot set headers on WebSocket upgrades)
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    if let Some(cookie) = req.cookie(TOKEN_PARAM) {
        return Some(cookie.value().to_string());
    }

    web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().access_token)
        .filter(|t| !t.is_empty())
}

/// Authenticated user extractor
///
/// Validates the access token and exposes the caller's identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,

    pub email: Option<String>,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Label recorded when this user approves or blocks someone
    pub fn display_name(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| self.user_id.to_string())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
            Some(service) => service.get_ref().clone(),
            None => {
                warn!("JwtService not found in app data");
                return ready(Err(AppError::Unauthorized(
                    "Authentication service not configured".to_string(),
                )));
            }
        };

        let token = match extract_token_from_request(req) {
            Some(t) => t,
            None => {
                debug!("No authentication token found in request");
                return ready(Err(AppError::Unauthorized(
                    "No authentication token provided".to_string(),
                )));
            }
        };

        let result = jwt_service.validate_token(&token).and_then(|claims| {
            let user_id = claims.user_id()?;
            debug!(user_id = %user_id, "User authenticated successfully");
            Ok(AuthenticatedUser {
                user_id,
                email: claims.email.clone(),
                claims,
            })
        });

        ready(result)
    }
}
