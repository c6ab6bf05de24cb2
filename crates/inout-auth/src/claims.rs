//! JWT Claims structure
//!
//! The subset of the identity provider's access-token claims this service
//! reads.

use chrono::{Duration, Utc};
use inout_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the user's id at the identity provider
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Provider role (e.g. `authenticated`); unrelated to the app's admin role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for a user, expiring in `expires_in_secs`
    pub fn new(user_id: Uuid, email: Option<&str>, expires_in_secs: i64) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// The subject as a user id
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::InvalidToken("subject is not a user id".to_string()))
    }
}
