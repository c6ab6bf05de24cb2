//! JWT validation service
//!
//! Verifies the identity provider's HS256 access tokens. Token creation is
//! kept for local tooling and tests; production tokens come from the provider.

use crate::claims::Claims;
use inout_core::error::AppError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, error, warn};

/// JWT Service for token validation
#[derive(Clone)]
pub struct JwtService {
    /// Expected `aud` claim, if any
    audience: Option<String>,

    encoding_key: EncodingKey,

    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    ///
    /// # Arguments
    ///
    /// * `secret` - The identity provider's JWT secret
    /// * `audience` - Required `aud` claim; `None` skips the audience check
    ///
    /// # Examples
    ///
    /// ```
    /// use inout_auth::JwtService;
    ///
    /// let jwt_service = JwtService::new("my-secret-key", Some("authenticated".to_string()));
    /// ```
    pub fn new(secret: &str, audience: Option<String>) -> Self {
        Self {
            audience,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign claims into a token
    pub fn create_token(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to create JWT token");
            AppError::InvalidToken(format!("Token creation failed: {}", e))
        })
    }

    /// Validate a JWT token and extract claims
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AppError::TokenExpired` if the token has expired
    /// - `AppError::InvalidToken` if the token is invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use inout_auth::{Claims, JwtService};
    /// use uuid::Uuid;
    ///
    /// let jwt_service = JwtService::new("secret", None);
    /// let claims = Claims::new(Uuid::new_v4(), Some("ana@example.com"), 3600);
    /// let token = jwt_service.create_token(&claims)?;
    /// let decoded = jwt_service.validate_token(&token)?;
    /// assert_eq!(decoded.sub, claims.sub);
    /// # Ok::<(), inout_core::error::AppError>(())
    /// ```
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        warn!("Token expired");
                        AppError::TokenExpired
                    }
                    _ => {
                        warn!(error = %e, "Invalid token");
                        AppError::InvalidToken(format!("Token validation failed: {}", e))
                    }
                }
            })?;

        let claims = token_data.claims;

        // validation allows clock leeway; sessions end at exp
        if claims.is_expired() {
            warn!(sub = %claims.sub, "Token expired (manual check)");
            return Err(AppError::TokenExpired);
        }

        debug!(sub = %claims.sub, "Token validated successfully");

        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("audience", &self.audience)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-12345";

    #[test]
    fn test_create_and_validate_token() {
        let jwt_service = JwtService::new(TEST_SECRET, None);
        let id = Uuid::new_v4();
        let token = jwt_service
            .create_token(&Claims::new(id, Some("ana@example.com"), 3600))
            .unwrap();

        let decoded = jwt_service.validate_token(&token).unwrap();
        assert_eq!(decoded.user_id().unwrap(), id);
        assert_eq!(decoded.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_expired_token() {
        let jwt_service = JwtService::new(TEST_SECRET, None);
        let token = jwt_service
            .create_token(&Claims::new(Uuid::new_v4(), None, -600))
            .unwrap();

        let result = jwt_service.validate_token(&token);
        assert!(matches!(result, Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let jwt_service = JwtService::new(TEST_SECRET, None);
        let result = jwt_service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_with_different_secret() {
        let issuer = JwtService::new("secret1", None);
        let verifier = JwtService::new("secret2", None);

        let token = issuer
            .create_token(&Claims::new(Uuid::new_v4(), None, 3600))
            .unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_audience_check() {
        let jwt_service = JwtService::new(TEST_SECRET, Some("authenticated".to_string()));

        let mut claims = Claims::new(Uuid::new_v4(), None, 3600);
        let token = jwt_service.create_token(&claims).unwrap();
        assert!(jwt_service.validate_token(&token).is_ok());

        claims.aud = Some("service".to_string());
        let token = jwt_service.create_token(&claims).unwrap();
        assert!(matches!(
            jwt_service.validate_token(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_debug_impl_hides_secret() {
        let jwt_service = JwtService::new(TEST_SECRET, None);
        let debug_str = format!("{:?}", jwt_service);

        assert!(debug_str.contains("JwtService"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(TEST_SECRET));
    }
}
