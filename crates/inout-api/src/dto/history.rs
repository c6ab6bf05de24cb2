//! Conversation history and agent settings DTOs

use crate::dto::PeriodParams;
use chrono::{DateTime, Utc};
use inout_core::models::{AgentSettings, ChatMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Session list query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionsQuery {
    #[serde(flatten)]
    pub period: PeriodParams,
    /// Keep sessions whose id contains this text
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
    pub total: usize,
}

/// One message as rendered in the chat view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Value,
    pub session_id: String,
    /// `human`, `ai`, ... when recorded
    pub kind: Option<String>,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ChatMessage> for MessageResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            session_id: message.session_id.clone(),
            kind: message.kind().map(str::to_string),
            content: message.content_text(),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableAgentResponse {
    pub cliente_id: String,
    pub updated_rows: usize,
}

/// Replace the agent prompt
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AgentPromptRequest {
    #[validate(length(max = 50000, message = "Prompt muito longo"))]
    pub agent_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettingsResponse {
    pub id: Value,
    pub agent_prompt: String,
}

impl From<AgentSettings> for AgentSettingsResponse {
    fn from(settings: AgentSettings) -> Self {
        Self {
            id: settings.id,
            agent_prompt: settings.agent_prompt.unwrap_or_default(),
        }
    }
}
