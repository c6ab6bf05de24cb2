//! Integration DTOs
//!
//! Requests of the setup flow and the integration as shown back to its owner.

use chrono::{DateTime, Utc};
use inout_core::{
    models::{Integration, IntegrationUpsert, ProjectCredentials},
    AppError,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Longest table name the store accepts
const MAX_TABLE_NAME: usize = 63;
const MAX_HOST_LEN: usize = 253;

/// Hint returned when the project has no `get_tables` function
pub const TABLES_HINT: &str = "Para listar tabelas automaticamente, crie uma função RPC 'get_tables' no seu Supabase ou insira o nome da tabela manualmente.";

/// Project URL and key, as typed in the setup flow
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "URL do projeto é obrigatória"))]
    pub project_url: String,

    #[validate(length(min = 1, message = "Chave pública é obrigatória"))]
    pub anon_key: String,
}

impl CredentialsRequest {
    /// Validate and normalise into credentials
    pub fn credentials(&self, allowed_suffixes: &[String]) -> Result<ProjectCredentials, AppError> {
        self.validate()?;
        Ok(ProjectCredentials {
            project_url: normalize_project_url(&self.project_url, allowed_suffixes)?,
            anon_key: self.anon_key.trim().to_string(),
        })
    }
}

/// Save the integration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IntegrationRequest {
    #[validate(length(min = 1, message = "URL do projeto é obrigatória"))]
    pub project_url: String,

    #[validate(length(min = 1, message = "Chave pública é obrigatória"))]
    pub anon_key: String,

    #[validate(length(min = 1, message = "Nome da tabela é obrigatório"))]
    pub selected_table: String,
}

impl IntegrationRequest {
    /// Validate every field and build the record to store
    pub fn to_upsert(&self, allowed_suffixes: &[String]) -> Result<IntegrationUpsert, AppError> {
        self.validate()?;
        let table = self.selected_table.trim();
        validate_table_name(table)?;

        Ok(IntegrationUpsert {
            project_url: normalize_project_url(&self.project_url, allowed_suffixes)?,
            anon_key: self.anon_key.trim().to_string(),
            selected_table: Some(table.to_string()),
        })
    }
}

/// Check a project URL and strip it down to scheme and host
pub fn normalize_project_url(raw: &str, allowed_suffixes: &[String]) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::MissingField("project_url".to_string()));
    }

    let url = Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("URL do projeto inválida: {}", e)))?;

    if url.scheme() != "https" {
        return Err(AppError::Validation(
            "URL do projeto deve usar https".to_string(),
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| AppError::Validation("URL do projeto sem host".to_string()))?
        .to_ascii_lowercase();

    let allowed = allowed_suffixes.iter().any(|suffix| {
        let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
        host == suffix || host.ends_with(&format!(".{}", suffix))
    });
    if !allowed {
        return Err(AppError::Validation(format!(
            "URL do projeto parece inválida: deve terminar em {}",
            allowed_suffixes.join(" ou ")
        )));
    }

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Table names are plain identifiers
pub fn validate_table_name(name: &str) -> Result<(), AppError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest || name.len() > MAX_TABLE_NAME {
        return Err(AppError::Validation(format!(
            "Nome de tabela inválido: {}",
            name
        )));
    }
    Ok(())
}

/// Check a project host named in a webhook path, e.g. `abc.supabase.co`
pub fn validate_project_host(host: &str) -> Result<(), AppError> {
    let valid = !host.is_empty()
        && host.len() <= MAX_HOST_LEN
        && !host.starts_with(['.', '-'])
        && !host.ends_with(['.', '-'])
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(AppError::Validation(format!("Projeto inválido: {}", host)));
    }
    Ok(())
}

/// Integration as shown to its owner; the key is masked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationResponse {
    pub project_url: String,
    pub anon_key_masked: String,
    pub selected_table: Option<String>,
    pub is_complete: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Integration> for IntegrationResponse {
    fn from(integration: &Integration) -> Self {
        Self {
            project_url: integration.project_url.clone(),
            anon_key_masked: integration.masked_key(),
            selected_table: integration.selected_table.clone(),
            is_complete: integration.is_complete(),
            updated_at: integration.updated_at,
        }
    }
}

/// Connection test outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tables found in the project, or a hint when they cannot be listed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
