//! Repository implementations
//!
//! Concrete implementations of the store traits defined in inout-core,
//! using sqlx for PostgreSQL access.

pub mod integration_repo;
pub mod preferences_repo;
pub mod user_control_repo;

pub use integration_repo::PgIntegrationRepository;
pub use preferences_repo::PgPreferencesRepository;
pub use user_control_repo::PgUserControlRepository;
