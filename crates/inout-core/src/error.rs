//! Unified error handling for Inout Metrics
//!
//! This module provides a single error type covering every failure the
//! backend can report, with automatic HTTP response mapping. The error codes
//! are what the dashboard client switches on to pick a screen: the setup
//! flow, the pending-approval page, or the connection-error state with retry.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    // ==================== External Project Errors ====================
    #[error("Could not reach the external project: {0}")]
    ExternalConnection(String),

    #[error("External project rejected the query: {0}")]
    ExternalQuery(String),

    #[error("Integration not configured: {0}")]
    IntegrationNotConfigured(String),

    // ==================== Authentication Errors ====================
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Account pending approval")]
    PendingApproval,

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Report generation failed: {0}")]
    Export(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            AppError::InvalidToken(_) | AppError::TokenExpired | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            AppError::Forbidden | AppError::PendingApproval => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 428 Precondition Required
            AppError::IntegrationNotConfigured(_) => StatusCode::PRECONDITION_REQUIRED,

            // 502 Bad Gateway
            AppError::ExternalConnection(_) | AppError::ExternalQuery(_) => {
                StatusCode::BAD_GATEWAY
            }

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::ExternalConnection(_) => "connection_error",
            AppError::ExternalQuery(_) => "external_query_error",
            AppError::IntegrationNotConfigured(_) => "integration_not_configured",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::PendingApproval => "pending_approval",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Export(_) => "export_error",
        }
    }

    /// Whether the client should offer a retry against the external project
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AppError::ExternalConnection(_) | AppError::ExternalQuery(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::ExternalConnection("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::IntegrationNotConfigured("no table".to_string()).status_code(),
            StatusCode::PRECONDITION_REQUIRED
        );
        assert_eq!(AppError::PendingApproval.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Validation("bad url".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::PendingApproval.error_code(), "pending_approval");
        assert_eq!(
            AppError::ExternalQuery("relation missing".to_string()).error_code(),
            "external_query_error"
        );
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(AppError::ExternalConnection("dns".to_string()).is_connectivity());
        assert!(AppError::ExternalQuery("denied".to_string()).is_connectivity());
        assert!(!AppError::PendingApproval.is_connectivity());
    }

    #[test]
    fn test_error_response_body() {
        let response = AppError::NotFound("lead 42".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
