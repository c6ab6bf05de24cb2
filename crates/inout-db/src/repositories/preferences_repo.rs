//! Display preferences repository implementation

use async_trait::async_trait;
use inout_core::{
    models::DisplayPreferences, traits::PreferencesRepository, AppError, AppResult,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of PreferencesRepository
pub struct PgPreferencesRepository {
    pool: PgPool,
}

impl PgPreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> DisplayPreferences {
        DisplayPreferences {
            show_conversas: row.get("show_conversas"),
            show_conversoes: row.get("show_conversoes"),
            show_qualificados: row.get("show_qualificados"),
            show_desqualificados: row.get("show_desqualificados"),
        }
    }
}

#[async_trait]
impl PreferencesRepository for PgPreferencesRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<DisplayPreferences>> {
        sqlx::query(
            r#"
            SELECT show_conversas, show_conversoes, show_qualificados, show_desqualificados
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .map(Self::map_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding preferences for {}: {}", user_id, e);
            AppError::Database(format!("Failed to find preferences: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn upsert(
        &self,
        user_id: Uuid,
        prefs: &DisplayPreferences,
    ) -> AppResult<DisplayPreferences> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (
                id, user_id, show_conversas, show_conversoes,
                show_qualificados, show_desqualificados
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                show_conversas = EXCLUDED.show_conversas,
                show_conversoes = EXCLUDED.show_conversoes,
                show_qualificados = EXCLUDED.show_qualificados,
                show_desqualificados = EXCLUDED.show_desqualificados,
                updated_at = NOW()
            RETURNING show_conversas, show_conversoes, show_qualificados, show_desqualificados
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(prefs.show_conversas)
        .bind(prefs.show_conversoes)
        .bind(prefs.show_qualificados)
        .bind(prefs.show_desqualificados)
        .map(Self::map_row)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error saving preferences for {}: {}", user_id, e);
            AppError::Database(format!("Failed to save preferences: {}", e))
        })
    }
}
