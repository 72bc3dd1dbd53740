use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{KycAdvance, PersonalInfoUpdate, User};
use crate::database::repository::{StoreError, UserStore};
use crate::types::{KycStatus, UserRole};

const USER_COLUMNS: &str = r#"
    id, full_name, email, phone, password_hash, profile_image,
    kyc_status, role, status, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, StoreError> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1) AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_personal_info(&self, id: i64, update: &PersonalInfoUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET full_name = $1, email = $2, phone = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_profile_image(&self, id: i64, reference: &str) -> Result<Option<String>, StoreError> {
        // Lock the row so the returned previous reference is the one actually replaced
        let previous: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            UPDATE users AS u
            SET profile_image = $2, updated_at = NOW()
            FROM (SELECT id, profile_image FROM users WHERE id = $1 FOR UPDATE) AS old
            WHERE u.id = old.id
            RETURNING old.profile_image
            "#,
        )
        .bind(id)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        Ok(previous.and_then(|(image,)| image))
    }

    async fn advance_kyc_status(&self, id: i64) -> Result<KycAdvance, StoreError> {
        let row: Option<(KycStatus, bool)> = sqlx::query_as(
            r#"
            WITH advanced AS (
                UPDATE users
                SET kyc_status = $2, updated_at = NOW()
                WHERE id = $1 AND kyc_status = $3
                RETURNING kyc_status
            )
            SELECT kyc_status, TRUE FROM advanced
            UNION ALL
            SELECT kyc_status, FALSE FROM users
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM advanced)
            "#,
        )
        .bind(id)
        .bind(KycStatus::Pending.as_str())
        .bind(KycStatus::None.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let (status, advanced) =
            row.ok_or_else(|| StoreError::Backend(format!("user {} disappeared during KYC update", id)))?;
        Ok(KycAdvance { status, advanced })
    }

    async fn admin_ids(&self) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE role = $1 AND status = 'active' ORDER BY id",
        )
        .bind(UserRole::Admin.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
