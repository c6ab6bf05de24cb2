//! Data-source trait implementations for [`RestClient`]

use crate::client::{range_filters, Params, RestClient};
use async_trait::async_trait;
use inout_core::{
    models::{lead::COL_CLIENT_ID, AgentSettings, ChatMessage, DateRange},
    traits::{ChatHistorySource, ExternalProject, LeadSource, SortOrder},
    AppResult,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

/// Table that never exists; querying it proves the URL and key are accepted
const PROBE_TABLE: &str = "_test_connection_";

/// Function listing the project's tables
const TABLES_FUNCTION: &str = "get_tables";

/// Upper bound on messages loaded for a single session
const MAX_SESSION_MESSAGES: usize = 10_000;

#[async_trait]
impl LeadSource for RestClient {
    #[instrument(skip(self, range))]
    async fn fetch_leads(
        &self,
        table: &str,
        range: &DateRange,
        order: SortOrder,
        max_rows: usize,
    ) -> AppResult<Vec<Value>> {
        let mut params: Params = vec![("select", "*".to_string())];
        params.extend(range_filters(range));
        params.push((
            "order",
            format!("created_at.{dir},id.{dir}", dir = order.as_str()),
        ));

        let rows = self.get_paged(table, &params, max_rows).await?;
        if rows.len() == max_rows {
            warn!(max_rows, "Lead fetch hit the row cap; results are truncated");
        }
        Ok(rows)
    }
}

#[async_trait]
impl ChatHistorySource for RestClient {
    #[instrument(skip(self, range))]
    async fn recent_session_ids(
        &self,
        table: &str,
        range: Option<&DateRange>,
        limit: usize,
    ) -> AppResult<Vec<String>> {
        let mut params: Params = vec![
            ("select", "session_id,id,created_at".to_string()),
            ("order", "created_at.desc,id.desc".to_string()),
        ];
        if let Some(range) = range {
            params.extend(range_filters(range));
        }

        let rows = self.get_paged(table, &params, limit).await?;

        Ok(rows
            .iter()
            .filter_map(|row| match row.get("session_id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(self, range))]
    async fn session_messages(
        &self,
        table: &str,
        session_id: &str,
        range: Option<&DateRange>,
    ) -> AppResult<Vec<ChatMessage>> {
        let mut params: Params = vec![
            ("select", "id,session_id,message,created_at".to_string()),
            ("session_id", format!("eq.{}", session_id)),
            ("order", "created_at.asc,id.asc".to_string()),
        ];
        if let Some(range) = range {
            params.extend(range_filters(range));
        }

        let rows = self
            .get_paged(table, &params, MAX_SESSION_MESSAGES)
            .await?;

        Ok(rows.iter().filter_map(ChatMessage::from_row).collect())
    }

    #[instrument(skip(self))]
    async fn disable_agent(&self, table: &str, client_id: &str) -> AppResult<usize> {
        let filters: Params = vec![
            (COL_CLIENT_ID, format!("eq.{}", client_id)),
            ("select", COL_CLIENT_ID.to_string()),
        ];

        let changed = self
            .patch_rows(table, &filters, &json!({ "agent_on": false }))
            .await?;

        info!(rows = changed.len(), "Agent disabled for lead");
        Ok(changed.len())
    }

    #[instrument(skip(self))]
    async fn agent_settings(&self, table: &str) -> AppResult<Option<AgentSettings>> {
        let params: Params = vec![
            ("select", "id,agent_prompt".to_string()),
            ("limit", "1".to_string()),
        ];

        let rows = self.get_rows(table, &params).await?;
        Ok(rows.into_iter().next().map(settings_from_row))
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn update_agent_prompt(
        &self,
        table: &str,
        id: &Value,
        prompt: &str,
    ) -> AppResult<Option<AgentSettings>> {
        let id_text = match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let filters: Params = vec![
            ("id", format!("eq.{}", id_text)),
            ("select", "id,agent_prompt".to_string()),
        ];

        let changed = self
            .patch_rows(table, &filters, &json!({ "agent_prompt": prompt }))
            .await?;

        Ok(changed.into_iter().next().map(settings_from_row))
    }
}

#[async_trait]
impl ExternalProject for RestClient {
    #[instrument(skip(self))]
    async fn test_connection(&self) -> AppResult<()> {
        let params: Params = vec![("select", "*".to_string()), ("limit", "1".to_string())];

        match self.get_rows(PROBE_TABLE, &params).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_probe_success() => Ok(()),
            Err(e) => {
                warn!(error = %e, "Connection test failed");
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        let value = self.rpc(TABLES_FUNCTION, &json!({})).await?;
        Ok(table_names(value))
    }
}

fn settings_from_row(row: Value) -> AgentSettings {
    AgentSettings {
        id: row.get("id").cloned().unwrap_or(Value::Null),
        agent_prompt: row
            .get("agent_prompt")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Flatten the shapes `get_tables` implementations return into names
///
/// Accepts a list of names, a list of `{table_name}` / `{name}` objects, or
/// either of those wrapped in an object.
pub(crate) fn table_names(value: Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(value, &mut names);

    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(n.clone()));
    names
}

fn collect_names(value: Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s),
        Value::Array(items) => items.into_iter().for_each(|v| collect_names(v, out)),
        Value::Object(obj) => {
            let named = ["table_name", "tablename", "name"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map(str::to_string);

            match named {
                Some(name) => out.push(name),
                None => obj.into_iter().for_each(|(_, v)| collect_names(v, out)),
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_shapes() {
        assert_eq!(table_names(json!(["leads", "chats"])), vec!["leads", "chats"]);
        assert_eq!(
            table_names(json!([{"table_name": "leads"}, {"table_name": "chats"}])),
            vec!["leads", "chats"]
        );
        assert_eq!(
            table_names(json!({"get_tables": ["leads", "leads", "chats"]})),
            vec!["leads", "chats"]
        );
        assert!(table_names(Value::Null).is_empty());
    }

    #[test]
    fn test_settings_from_row() {
        let s = settings_from_row(json!({"id": 3, "agent_prompt": "Seja cordial"}));
        assert_eq!(s.id, json!(3));
        assert_eq!(s.agent_prompt.as_deref(), Some("Seja cordial"));
    }
}
