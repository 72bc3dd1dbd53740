use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::database::models::Preferences;
use crate::database::repository::{PreferencesStore, StoreError};

#[derive(Clone)]
pub struct PgPreferencesStore {
    pool: PgPool,
}

impl PgPreferencesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesStore for PgPreferencesStore {
    async fn find(&self, user_id: i64) -> Result<Option<Preferences>, StoreError> {
        let row: Option<(Json<Preferences>,)> =
            sqlx::query_as("SELECT data FROM user_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(prefs),)| prefs))
    }

    async fn upsert(&self, user_id: i64, preferences: &Preferences) -> Result<(), StoreError> {
        // user_id is the primary key, so concurrent saves serialize on the conflict target
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, data, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(Json(preferences))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
