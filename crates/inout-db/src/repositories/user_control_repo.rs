//! Access control repository implementation

use async_trait::async_trait;
use inout_core::{
    models::{UserControl, UserRole},
    traits::UserControlRepository,
    AppError, AppResult,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, user_id, email, role, approved, approved_by, created_at, updated_at";

/// PostgreSQL implementation of UserControlRepository
pub struct PgUserControlRepository {
    pool: PgPool,
}

impl PgUserControlRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> UserControl {
        UserControl {
            id: row.get("id"),
            user_id: row.get("user_id"),
            email: row.get("email"),
            role: UserRole::parse(row.get("role")),
            approved: row.get("approved"),
            approved_by: row.get("approved_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl UserControlRepository for PgUserControlRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserControl>> {
        sqlx::query(&format!(
            "SELECT {} FROM user_control WHERE user_id = $1",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .map(Self::map_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user control for {}: {}", user_id, e);
            AppError::Database(format!("Failed to find user control: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn ensure(&self, user_id: Uuid, email: &str) -> AppResult<UserControl> {
        if let Some(existing) = self.find_by_user(user_id).await? {
            return Ok(existing);
        }

        debug!("Creating pending user control row for {}", user_id);

        // a concurrent first request may win the insert; the no-op update
        // makes RETURNING yield the stored row either way
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO user_control (id, user_id, email, role, approved)
            VALUES ($1, $2, $3, 'user', FALSE)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(email)
        .map(Self::map_row)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating user control for {}: {}", user_id, e);
            AppError::Database(format!("Failed to create user control: {}", e))
        })?;

        info!(user_id = %user_id, "Registered new user pending approval");
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> AppResult<Vec<UserControl>> {
        sqlx::query(&format!(
            "SELECT {} FROM user_control ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .map(Self::map_row)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing user control rows: {}", e);
            AppError::Database(format!("Failed to list users: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn set_approval(
        &self,
        user_id: Uuid,
        approved: bool,
        approved_by: &str,
    ) -> AppResult<Option<UserControl>> {
        sqlx::query(&format!(
            r#"
            UPDATE user_control
            SET approved = $2, approved_by = $3, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(approved)
        .bind(approved_by)
        .map(Self::map_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating approval for {}: {}", user_id, e);
            AppError::Database(format!("Failed to update approval: {}", e))
        })
    }
}
