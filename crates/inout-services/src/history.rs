//! Conversation history and agent settings
//!
//! Reads the agent's chat log from the user's external project and lets the
//! user switch the agent off for a lead or edit its prompt.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use inout_core::{
    config::DashboardConfig,
    models::{distinct_sessions, AgentSettings, ChatMessage, DateRange, Period, PeriodSelection},
    traits::ExternalProject,
    AppError, AppResult,
};
use tracing::{info, instrument};

/// History operations against one set of external tables
pub struct HistoryService {
    chat_table: String,
    leads_table: String,
    agent_settings_table: String,
    scan_limit: usize,
    tz: Tz,
}

impl HistoryService {
    pub fn new(config: &DashboardConfig, tz: Tz) -> Self {
        Self {
            chat_table: config.chat_table.clone(),
            leads_table: config.leads_table.clone(),
            agent_settings_table: config.agent_settings_table.clone(),
            scan_limit: config.history_scan_limit,
            tz,
        }
    }

    /// The "all" period reads without a time filter
    fn range(&self, selection: &PeriodSelection, now: DateTime<Utc>) -> AppResult<Option<DateRange>> {
        if selection.period == Period::All {
            return Ok(None);
        }
        selection.current_range(now, self.tz).map(Some)
    }

    /// Distinct session ids, most recently active first
    ///
    /// `search` keeps only sessions whose id contains it.
    #[instrument(skip(self, project, selection))]
    pub async fn sessions(
        &self,
        project: &dyn ExternalProject,
        selection: &PeriodSelection,
        search: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        let range = self.range(selection, now)?;
        let ids = project
            .recent_session_ids(&self.chat_table, range.as_ref(), self.scan_limit)
            .await?;

        let mut sessions = distinct_sessions(ids.iter().map(String::as_str));
        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            sessions.retain(|id| id.contains(needle));
        }
        Ok(sessions)
    }

    /// Messages of one session, oldest first
    #[instrument(skip(self, project, selection))]
    pub async fn messages(
        &self,
        project: &dyn ExternalProject,
        session_id: &str,
        selection: &PeriodSelection,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ChatMessage>> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::MissingField("session_id".to_string()));
        }

        let range = self.range(selection, now)?;
        project
            .session_messages(&self.chat_table, session_id, range.as_ref())
            .await
    }

    /// Switch the agent off for every lead row of a client
    #[instrument(skip(self, project))]
    pub async fn disable_agent(&self, project: &dyn ExternalProject, client_id: &str) -> AppResult<usize> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(AppError::MissingField("cliente_id".to_string()));
        }

        let changed = project.disable_agent(&self.leads_table, client_id).await?;
        if changed == 0 {
            return Err(AppError::NotFound(format!(
                "no lead with cliente_id {} in {}",
                client_id, self.leads_table
            )));
        }

        info!(changed, "Agent disabled");
        Ok(changed)
    }

    /// Current agent settings
    #[instrument(skip(self, project))]
    pub async fn agent_settings(&self, project: &dyn ExternalProject) -> AppResult<AgentSettings> {
        project
            .agent_settings(&self.agent_settings_table)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no row in {}", self.agent_settings_table)))
    }

    /// Replace the agent prompt of the settings row
    #[instrument(skip(self, project, prompt))]
    pub async fn update_agent_prompt(
        &self,
        project: &dyn ExternalProject,
        prompt: &str,
    ) -> AppResult<AgentSettings> {
        let current = self.agent_settings(project).await?;

        let updated = project
            .update_agent_prompt(&self.agent_settings_table, &current.id, prompt)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no row in {}", self.agent_settings_table)))?;

        info!(prompt_len = prompt.len(), "Agent prompt updated");
        Ok(updated)
    }
}
