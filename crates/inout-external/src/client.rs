//! HTTP client for one external project

use crate::error::RestError;
use inout_core::{
    config::ExternalConfig,
    models::{lead::COL_CREATED_AT, DateRange, ProjectCredentials},
    traits::{ExternalProject, ExternalProjectFactory},
    AppError, AppResult,
};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Query string pairs; keys repeat for range filters
pub(crate) type Params = Vec<(&'static str, String)>;

/// Client bound to one project URL and API key
pub struct RestClient {
    http: Client,
    base_url: String,
    anon_key: String,
    page_size: usize,
    timeout_secs: u64,
}

impl RestClient {
    /// Create a client sharing an existing connection pool
    pub fn new(
        http: Client,
        credentials: &ProjectCredentials,
        page_size: usize,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http,
            base_url: credentials.project_url.trim_end_matches('/').to_string(),
            anon_key: credentials.anon_key.clone(),
            page_size: page_size.max(1),
            timeout_secs,
        }
    }

    /// Project base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RestError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                RestError::Timeout(self.timeout_secs)
            } else {
                RestError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), "External project returned an error");
        Err(RestError::from_response(status.as_u16(), &body))
    }

    async fn read_json(response: Response) -> Result<Value, RestError> {
        let body = response
            .text()
            .await
            .map_err(|e| RestError::Parse(format!("Failed to read response body: {}", e)))?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| RestError::Parse(format!("Failed to parse JSON: {}", e)))
    }

    fn into_rows(value: Value) -> Result<Vec<Value>, RestError> {
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(RestError::Parse(format!(
                "expected an array of rows, got {}",
                other
            ))),
        }
    }

    /// One GET against a table
    #[instrument(skip(self, params), fields(table = %table))]
    pub(crate) async fn get_rows(&self, table: &str, params: &Params) -> Result<Vec<Value>, RestError> {
        let request = self.http.get(self.table_url(table)).query(params);
        let response = self.send(request).await?;
        Self::into_rows(Self::read_json(response).await?)
    }

    /// GET every page of a query, stopping at `max_rows`
    ///
    /// The caller's params must carry a total order so pages do not overlap.
    #[instrument(skip(self, params), fields(table = %table))]
    pub(crate) async fn get_paged(
        &self,
        table: &str,
        params: &Params,
        max_rows: usize,
    ) -> Result<Vec<Value>, RestError> {
        let mut rows: Vec<Value> = Vec::new();

        while rows.len() < max_rows {
            let wanted = self.page_size.min(max_rows - rows.len());

            let mut page_params = params.clone();
            page_params.push(("limit", wanted.to_string()));
            page_params.push(("offset", rows.len().to_string()));

            let page = self.get_rows(table, &page_params).await?;
            let received = page.len();
            rows.extend(page);

            debug!(received, total = rows.len(), "Fetched page");

            if received < wanted {
                break;
            }
        }

        Ok(rows)
    }

    /// PATCH rows matching `filters`, returning the changed rows
    #[instrument(skip(self, filters, body), fields(table = %table))]
    pub(crate) async fn patch_rows(
        &self,
        table: &str,
        filters: &Params,
        body: &Value,
    ) -> Result<Vec<Value>, RestError> {
        let request = self
            .http
            .patch(self.table_url(table))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(body);

        let response = self.send(request).await?;
        Self::into_rows(Self::read_json(response).await?)
    }

    /// Call a database function
    #[instrument(skip(self, args))]
    pub(crate) async fn rpc(&self, function: &str, args: &Value) -> Result<Value, RestError> {
        let request = self.http.post(self.rpc_url(function)).json(args);
        let response = self.send(request).await?;
        Self::read_json(response).await
    }
}

/// `created_at` bounds for a range, both inclusive
pub(crate) fn range_filters(range: &DateRange) -> Params {
    vec![
        (COL_CREATED_AT, format!("gte.{}", to_iso(range.start))),
        (COL_CREATED_AT, format!("lte.{}", to_iso(range.end))),
    ]
}

fn to_iso(instant: chrono::DateTime<chrono::Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Builds [`RestClient`]s that share one connection pool
#[derive(Clone)]
pub struct RestClientFactory {
    http: Client,
    page_size: usize,
    timeout_secs: u64,
}

impl RestClientFactory {
    /// Create a factory from the external client settings
    pub fn new(config: &ExternalConfig) -> AppResult<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            page_size: config.page_size,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Build a concrete client
    pub fn client(&self, credentials: &ProjectCredentials) -> RestClient {
        RestClient::new(
            self.http.clone(),
            credentials,
            self.page_size,
            self.timeout_secs,
        )
    }
}

impl ExternalProjectFactory for RestClientFactory {
    fn connect(&self, credentials: &ProjectCredentials) -> AppResult<Arc<dyn ExternalProject>> {
        Ok(Arc::new(self.client(credentials)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_range_filters() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 6, 8, 3, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 16, 2, 59, 59).unwrap(),
        };
        let filters = range_filters(&range);
        assert_eq!(filters[0], ("created_at", "gte.2024-06-08T03:00:00.000Z".to_string()));
        assert_eq!(filters[1], ("created_at", "lte.2024-06-16T02:59:59.000Z".to_string()));
    }

    #[test]
    fn test_client_urls() {
        let factory = RestClientFactory::new(&ExternalConfig::default()).unwrap();
        let client = factory.client(&ProjectCredentials {
            project_url: "https://abc.supabase.co/".to_string(),
            anon_key: "key".to_string(),
        });
        assert_eq!(client.base_url(), "https://abc.supabase.co");
        assert_eq!(client.table_url("leads"), "https://abc.supabase.co/rest/v1/leads");
        assert_eq!(
            client.rpc_url("get_tables"),
            "https://abc.supabase.co/rest/v1/rpc/get_tables"
        );
    }
}
