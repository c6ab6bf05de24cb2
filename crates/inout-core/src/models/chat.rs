//! Chat history model
//!
//! Messages written by the conversation agent into the external project.
//! The `message` column is free-form: a plain string or an object whose
//! `content` field carries the text.

use super::lead::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Value,
    pub session_id: String,
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Build a message from a raw row; rows without a session are dropped
    pub fn from_row(row: &Value) -> Option<Self> {
        let session_id = match row.get("session_id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(Self {
            id: row.get("id").cloned().unwrap_or(Value::Null),
            session_id,
            message: row.get("message").cloned().unwrap_or(Value::Null),
            created_at: row
                .get("created_at")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
        })
    }

    /// Text to display for the message
    pub fn content_text(&self) -> String {
        match &self.message {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Object(obj) => match obj.get("content") {
                Some(Value::String(s)) => s.clone(),
                _ => self.message.to_string(),
            },
            other => other.to_string(),
        }
    }

    /// Author kind (`human`, `ai`, ...) when the agent recorded one
    pub fn kind(&self) -> Option<&str> {
        self.message.get("type").and_then(Value::as_str)
    }
}

/// Agent configuration row in the external project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub id: Value,
    #[serde(default)]
    pub agent_prompt: Option<String>,
}

/// Keep the first occurrence of every non-empty session id, in input order
pub fn distinct_sessions<'a, I>(session_ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    session_ids
        .into_iter()
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
