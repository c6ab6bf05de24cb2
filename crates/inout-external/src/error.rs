//! External project client errors

use inout_core::AppError;
use serde::Deserialize;
use thiserror::Error;

/// Errors talking to the external project
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: request took longer than {0}s")]
    Timeout(u64),

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Error body returned by PostgREST and the API gateway in front of it
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    hint: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl RestError {
    /// Build an HTTP error from a status and raw response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let message = parsed
            .message
            .or(parsed.error_description)
            .or(parsed.error)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("status {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        let message = match parsed.hint {
            Some(hint) if !hint.is_empty() => format!("{} ({})", message, hint),
            _ => message,
        };

        RestError::Http {
            status,
            code: parsed.code,
            message,
        }
    }

    /// Whether a failed probe still proves the project answered with valid credentials
    pub fn is_probe_success(&self) -> bool {
        match self {
            RestError::Http { message, .. } => {
                let m = message.to_lowercase();
                m.contains("does not exist")
                    || m.contains("permission denied")
                    || m.contains("could not find")
            }
            _ => false,
        }
    }
}

impl From<RestError> for AppError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Connection(_) | RestError::Timeout(_) => {
                AppError::ExternalConnection(err.to_string())
            }
            RestError::Http { message, .. } => AppError::ExternalQuery(message),
            RestError::Parse(_) => AppError::ExternalQuery(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_reads_postgrest_body() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public._test_connection_\" does not exist"}"#;
        let err = RestError::from_response(404, body);
        match &err {
            RestError::Http { status, code, .. } => {
                assert_eq!(*status, 404);
                assert_eq!(code.as_deref(), Some("42P01"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.is_probe_success());
    }

    #[test]
    fn test_schema_cache_miss_counts_as_probe_success() {
        let body = r#"{"code":"PGRST205","message":"Could not find the table 'public._test_connection_' in the schema cache","hint":"Perhaps you meant the table 'public.leads'"}"#;
        assert!(RestError::from_response(404, body).is_probe_success());
    }

    #[test]
    fn test_invalid_key_is_not_probe_success() {
        let err = RestError::from_response(401, r#"{"message":"Invalid API key"}"#);
        assert!(!err.is_probe_success());
        assert!(matches!(AppError::from(err), AppError::ExternalQuery(m) if m == "Invalid API key"));
    }

    #[test]
    fn test_plain_text_body() {
        let err = RestError::from_response(503, "upstream unavailable");
        assert_eq!(err.to_string(), "HTTP 503: upstream unavailable");
    }

    #[test]
    fn test_connectivity_mapping() {
        let app: AppError = RestError::Timeout(30).into();
        assert!(matches!(app, AppError::ExternalConnection(_)));
    }
}
