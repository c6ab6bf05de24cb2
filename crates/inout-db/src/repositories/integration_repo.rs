//! Integration repository implementation

use async_trait::async_trait;
use inout_core::{
    models::{Integration, IntegrationUpsert},
    traits::IntegrationRepository,
    AppError, AppResult,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of IntegrationRepository
pub struct PgIntegrationRepository {
    pool: PgPool,
}

impl PgIntegrationRepository {
    /// Create a new integration repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> Integration {
        Integration {
            id: row.get("id"),
            user_id: row.get("user_id"),
            project_url: row.get("project_url"),
            anon_key: row.get("anon_key"),
            selected_table: row.get("selected_table"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl IntegrationRepository for PgIntegrationRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Integration>> {
        debug!("Finding integration for user {}", user_id);

        sqlx::query(
            r#"
            SELECT id, user_id, project_url, anon_key, selected_table, created_at, updated_at
            FROM user_integrations
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .map(Self::map_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding integration for {}: {}", user_id, e);
            AppError::Database(format!("Failed to find integration: {}", e))
        })
    }

    #[instrument(skip(self, data), fields(project_url = %data.project_url))]
    async fn upsert(&self, user_id: Uuid, data: &IntegrationUpsert) -> AppResult<Integration> {
        debug!("Saving integration for user {}", user_id);

        sqlx::query(
            r#"
            INSERT INTO user_integrations (id, user_id, project_url, anon_key, selected_table)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                project_url = EXCLUDED.project_url,
                anon_key = EXCLUDED.anon_key,
                selected_table = EXCLUDED.selected_table,
                updated_at = NOW()
            RETURNING id, user_id, project_url, anon_key, selected_table, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&data.project_url)
        .bind(&data.anon_key)
        .bind(&data.selected_table)
        .map(Self::map_row)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error saving integration for {}: {}", user_id, e);
            AppError::Database(format!("Failed to save integration: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn delete_by_user(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM user_integrations WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting integration for {}: {}", user_id, e);
                AppError::Database(format!("Failed to delete integration: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
