//! API layer for Inout Metrics
//!
//! HTTP handlers for the dashboard, the integration setup flow, conversation
//! history, access control and the live WebSocket feed.
//!
//! Handlers share one [`AppState`] holding the repositories, the external
//! project factory and the services; the caller is identified by
//! [`inout_auth::AuthenticatedUser`].

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::{ApiResponse, PeriodParams};
pub use handlers::{configure_routes, ws_handler};
pub use state::AppState;
