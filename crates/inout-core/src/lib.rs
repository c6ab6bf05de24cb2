//! Inout Metrics Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Inout Metrics dashboard backend. It includes:
//!
//! - Domain models (lead records, integrations, preferences, access control)
//! - Period and date-range arithmetic used by every refresh cycle
//! - Traits for the application store and the external project
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
