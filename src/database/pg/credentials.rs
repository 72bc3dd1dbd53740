use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::auth::password::{CredentialService, PasswordChange, PasswordCheck, PasswordPolicy};
use crate::database::StoreError;

/// Password checks against `users.password_hash`
#[derive(Clone)]
pub struct PgCredentialService {
    pool: PgPool,
    policy: PasswordPolicy,
}

impl PgCredentialService {
    pub fn new(pool: PgPool, policy: PasswordPolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl CredentialService for PgCredentialService {
    async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new: &str,
    ) -> Result<PasswordChange, StoreError> {
        let stored: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((stored_hash,)) = stored else {
            return Ok(PasswordChange::refused("User not found"));
        };

        let check = self
            .policy
            .evaluate_blocking(stored_hash.clone(), current.to_string(), new.to_string())
            .await?;
        let new_hash = match check {
            PasswordCheck::Accepted { new_hash } => new_hash,
            PasswordCheck::Refused(reason) => return Ok(PasswordChange::refused(reason)),
        };

        // Compare-and-set: a concurrent change since the read makes this a no-op
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2 AND password_hash = $3
            "#,
        )
        .bind(&new_hash)
        .bind(user_id)
        .bind(&stored_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(PasswordChange::refused(
                "Password was changed by another request, please try again",
            ));
        }

        info!(user_id, "Password hash replaced");
        Ok(PasswordChange::changed())
    }
}
