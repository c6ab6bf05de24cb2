//! Integration model
//!
//! A user's link to their external project: where it lives, the key used to
//! read it and the table holding their leads.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored integration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Base URL of the external project, e.g. `https://abc.supabase.co`
    pub project_url: String,

    /// Public (anon) API key; never echoed back in full
    #[serde(skip_serializing)]
    pub anon_key: String,

    /// Table the dashboard reads leads from
    pub selected_table: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Where the external project lives and how to authenticate against it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCredentials {
    pub project_url: String,
    pub anon_key: String,
}

impl ProjectCredentials {
    /// Lowercased host of the project URL
    ///
    /// Change notifications name their project by this host.
    pub fn project_host(&self) -> String {
        let rest = self
            .project_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.project_url);
        rest.split(['/', ':', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// Credentials plus the lead table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalConnection {
    pub credentials: ProjectCredentials,
    pub table: String,
}

impl Integration {
    /// Project credentials, failing when setup never stored them
    pub fn credentials(&self) -> Result<ProjectCredentials, AppError> {
        if self.project_url.trim().is_empty() || self.anon_key.trim().is_empty() {
            return Err(AppError::IntegrationNotConfigured(
                "project URL and API key are required".to_string(),
            ));
        }

        Ok(ProjectCredentials {
            project_url: self.project_url.trim().trim_end_matches('/').to_string(),
            anon_key: self.anon_key.trim().to_string(),
        })
    }

    /// Connection details, failing when setup was never finished
    pub fn connection(&self) -> Result<ExternalConnection, AppError> {
        let credentials = self.credentials()?;

        let table = self
            .selected_table
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::IntegrationNotConfigured("no table selected".to_string())
            })?;

        Ok(ExternalConnection {
            credentials,
            table: table.to_string(),
        })
    }

    /// Whether setup is finished
    pub fn is_complete(&self) -> bool {
        self.connection().is_ok()
    }

    /// Key with everything but the last four characters masked
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.anon_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(8), tail)
    }
}

/// Data written by the setup flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationUpsert {
    pub project_url: String,
    pub anon_key: String,
    pub selected_table: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integration(table: Option<&str>) -> Integration {
        let now = Utc::now();
        Integration {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_url: "https://abc.supabase.co/".to_string(),
            anon_key: "eyJhbGciOiJIUzI1NiJ9.key".to_string(),
            selected_table: table.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_connection_requires_table() {
        let err = integration(None).connection().unwrap_err();
        assert!(matches!(err, AppError::IntegrationNotConfigured(_)));

        let err = integration(Some("  ")).connection().unwrap_err();
        assert!(matches!(err, AppError::IntegrationNotConfigured(_)));

        // history only needs the credentials
        assert!(integration(None).credentials().is_ok());
    }

    #[test]
    fn test_connection_trims_url() {
        let conn = integration(Some("leads")).connection().unwrap();
        assert_eq!(conn.credentials.project_url, "https://abc.supabase.co");
        assert_eq!(conn.table, "leads");
    }

    #[test]
    fn test_project_host() {
        let creds = |url: &str| ProjectCredentials {
            project_url: url.to_string(),
            anon_key: "k".to_string(),
        };
        assert_eq!(creds("https://ABC.supabase.co").project_host(), "abc.supabase.co");
        assert_eq!(creds("https://abc.supabase.co:443/rest").project_host(), "abc.supabase.co");
        assert_eq!(creds("abc.supabase.co").project_host(), "abc.supabase.co");
    }

    #[test]
    fn test_masked_key() {
        let i = integration(Some("leads"));
        assert_eq!(i.masked_key(), "********.key");
        assert!(!serde_json::to_string(&i).unwrap().contains("eyJ"));
    }
}
