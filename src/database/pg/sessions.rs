use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{Session, SessionIdentity};
use crate::database::repository::{SessionStore, StoreError};

const SESSION_COLUMNS: &str = r#"
    id, user_id, ip_address, user_agent, csrf_token,
    cached_name, cached_email, cached_kyc_status,
    last_activity, expires_at, created_at
"#;

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Session>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM sessions
            WHERE user_id = $1 AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY last_activity DESC
            "#,
            SESSION_COLUMNS
        );
        let sessions = sqlx::query_as::<_, Session>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    async fn delete_owned(&self, id: &str, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET last_activity = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn refresh_identity(&self, id: &str, identity: &SessionIdentity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET cached_name = $1, cached_email = $2, cached_kyc_status = $3
            WHERE id = $4
            "#,
        )
        .bind(&identity.full_name)
        .bind(&identity.email)
        .bind(identity.kyc_status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
