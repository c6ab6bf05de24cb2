//! Domain models for Inout Metrics
//!
//! This module contains all the core domain models used throughout the application.

pub mod chat;
pub mod integration;
pub mod lead;
pub mod period;
pub mod preferences;
pub mod user_control;

pub use chat::{distinct_sessions, AgentSettings, ChatMessage};
pub use integration::{ExternalConnection, Integration, IntegrationUpsert, ProjectCredentials};
pub use lead::{parse_timestamp, LeadBatch, LeadRecord, MalformedRow};
pub use period::{CustomRange, DateRange, Period, PeriodSelection};
pub use preferences::{DisplayPreferences, PreferencesUpdate};
pub use user_control::{ApprovalStatus, UserControl, UserRole};
