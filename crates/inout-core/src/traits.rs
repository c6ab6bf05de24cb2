//! Common traits for repositories and external data sources
//!
//! The application store (integrations, preferences, access control) and the
//! user's external project are both reached through these abstractions so
//! services and handlers never depend on a concrete backend.

use crate::error::AppError;
use crate::models::{
    AgentSettings, ChatMessage, DateRange, DisplayPreferences, Integration, IntegrationUpsert,
    ProjectCredentials, UserControl,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Integration repository
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// Find the integration of a user
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Integration>, AppError>;

    /// Insert or replace the integration of a user
    async fn upsert(&self, user_id: Uuid, data: &IntegrationUpsert)
        -> Result<Integration, AppError>;

    /// Delete the integration of a user
    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool, AppError>;
}

/// Display preferences repository
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Stored preferences, `None` when the user never saved any
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<DisplayPreferences>, AppError>;

    /// Insert or replace the preferences of a user
    async fn upsert(
        &self,
        user_id: Uuid,
        prefs: &DisplayPreferences,
    ) -> Result<DisplayPreferences, AppError>;
}

/// Access control repository
#[async_trait]
pub trait UserControlRepository: Send + Sync {
    /// Find the control row of a user
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserControl>, AppError>;

    /// Fetch the control row, creating a pending `user` row on first access
    async fn ensure(&self, user_id: Uuid, email: &str) -> Result<UserControl, AppError>;

    /// All rows, newest first
    async fn list_all(&self) -> Result<Vec<UserControl>, AppError>;

    /// Approve or block a user, recording who did it
    async fn set_approval(
        &self,
        user_id: Uuid,
        approved: bool,
        approved_by: &str,
    ) -> Result<Option<UserControl>, AppError>;
}

/// Row ordering on the creation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Reads lead rows from the user's table
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Raw rows whose creation timestamp falls inside `range`
    ///
    /// At most `max_rows` rows are returned.
    async fn fetch_leads(
        &self,
        table: &str,
        range: &DateRange,
        order: SortOrder,
        max_rows: usize,
    ) -> Result<Vec<Value>, AppError>;
}

/// Reads and edits the agent's conversation data
#[async_trait]
pub trait ChatHistorySource: Send + Sync {
    /// Session ids of the newest `limit` messages, newest first, duplicates included
    async fn recent_session_ids(
        &self,
        table: &str,
        range: Option<&DateRange>,
        limit: usize,
    ) -> Result<Vec<String>, AppError>;

    /// Messages of one session in ascending time order
    async fn session_messages(
        &self,
        table: &str,
        session_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<ChatMessage>, AppError>;

    /// Turn the agent off for every lead row of a client; returns rows changed
    async fn disable_agent(&self, table: &str, client_id: &str) -> Result<usize, AppError>;

    /// First agent settings row
    async fn agent_settings(&self, table: &str) -> Result<Option<AgentSettings>, AppError>;

    /// Replace the agent prompt of a settings row
    async fn update_agent_prompt(
        &self,
        table: &str,
        id: &Value,
        prompt: &str,
    ) -> Result<Option<AgentSettings>, AppError>;
}

/// Everything the backend does against one external project
#[async_trait]
pub trait ExternalProject: LeadSource + ChatHistorySource {
    /// Check the URL and key are accepted by the project
    async fn test_connection(&self) -> Result<(), AppError>;

    /// Tables exposed through the `get_tables` function
    async fn list_tables(&self) -> Result<Vec<String>, AppError>;
}

/// Builds a client for one project; there is no process-wide client
pub trait ExternalProjectFactory: Send + Sync {
    fn connect(&self, credentials: &ProjectCredentials)
        -> Result<Arc<dyn ExternalProject>, AppError>;
}
