//! Session token verification for Inout Metrics
//!
//! Users sign in with an external identity provider, which issues HS256
//! access tokens. This crate verifies those tokens and exposes the caller
//! to Actix-web handlers. Application roles and approval are not part of
//! the token; they live in the application store.
//!
//! # Examples
//!
//! ```no_run
//! use actix_web::HttpResponse;
//! use inout_auth::AuthenticatedUser;
//!
//! async fn protected_route(user: AuthenticatedUser) -> HttpResponse {
//!     HttpResponse::Ok().json(serde_json::json!({
//!         "user_id": user.user_id,
//!         "email": user.email
//!     }))
//! }
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::AuthenticatedUser;
