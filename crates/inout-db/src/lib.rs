//! Inout Metrics Database Layer
//!
//! This crate provides PostgreSQL access to the application's own store:
//!
//! - Connection pool management with sqlx
//! - Embedded schema migrations
//! - Repository implementations for integrations, preferences and access control

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use inout_core::{AppError, AppResult};
pub use sqlx::PgPool;
