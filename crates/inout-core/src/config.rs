//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub external: ExternalConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:5173,http://127.0.0.1:5173".to_string()
}

/// Database configuration for the application's own store
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Run embedded migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

/// Authentication configuration
///
/// Sessions are issued by the external identity provider; this service only
/// verifies the HS256 access tokens it signs.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret shared with the identity provider
    pub jwt_secret: String,

    /// Expected `aud` claim, if the provider sets one
    #[serde(default)]
    pub audience: Option<String>,
}

/// Dashboard behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// IANA time zone used for "today", day boundaries and peak-hour buckets
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// External table holding chat messages
    #[serde(default = "default_chat_table")]
    pub chat_table: String,

    /// External table whose `agent_on` flag is toggled from the history view
    #[serde(default = "default_leads_table")]
    pub leads_table: String,

    /// External table holding the agent prompt
    #[serde(default = "default_agent_settings_table")]
    pub agent_settings_table: String,

    /// Maximum rows scanned when listing chat sessions
    #[serde(default = "default_history_scan_limit")]
    pub history_scan_limit: usize,

    /// Maximum rows fetched for a single metrics or export request
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_chat_table() -> String {
    "n8n_chat_histories".to_string()
}

fn default_leads_table() -> String {
    "leads_metricas".to_string()
}

fn default_agent_settings_table() -> String {
    "agent_settings".to_string()
}

fn default_history_scan_limit() -> usize {
    2000
}

fn default_max_rows() -> usize {
    100_000
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            chat_table: default_chat_table(),
            leads_table: default_leads_table(),
            agent_settings_table: default_agent_settings_table(),
            history_scan_limit: default_history_scan_limit(),
            max_rows: default_max_rows(),
        }
    }
}

impl DashboardConfig {
    /// Parse the configured time zone
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Message(format!("invalid dashboard.timezone: {}", e)))
    }
}

/// External project client settings
#[derive(Debug, Deserialize, Clone)]
pub struct ExternalConfig {
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Rows requested per page when reading a table
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Host suffixes accepted for project URLs
    #[serde(default = "default_allowed_hosts")]
    pub allowed_host_suffixes: Vec<String>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    1000
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["supabase.co".to_string(), "supabase.in".to_string()]
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
            allowed_host_suffixes: default_allowed_hosts(),
        }
    }
}

/// Realtime change notifications
#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeConfig {
    /// Shared secret expected in the `x-webhook-secret` header
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// WebSocket keepalive ping interval in seconds
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Buffered notifications per table channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_ping_interval() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            ping_interval_secs: default_ping_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 9001)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("dashboard.timezone", default_timezone())?
            .set_default("external.request_timeout_secs", 30)?
            .set_default("realtime.ping_interval_secs", 30)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with INOUT_ prefix
            .add_source(
                Environment::with_prefix("INOUT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("external.allowed_host_suffixes")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.dashboard.tz()?;
        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("INOUT").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dashboard_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.chat_table, "n8n_chat_histories");
        assert_eq!(config.history_scan_limit, 2000);
        assert_eq!(config.tz().unwrap(), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let config = DashboardConfig {
            timezone: "Mars/Olympus".to_string(),
            ..DashboardConfig::default()
        };
        assert!(config.tz().is_err());
    }

    #[test]
    fn test_default_external_hosts() {
        let config = ExternalConfig::default();
        assert!(config
            .allowed_host_suffixes
            .iter()
            .any(|h| h == "supabase.co"));
        assert_eq!(config.page_size, 1000);
    }
}
