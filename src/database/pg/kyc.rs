use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::NewKycDocument;
use crate::database::repository::{KycStore, StoreError};
use crate::types::ReviewStatus;

#[derive(Clone)]
pub struct PgKycStore {
    pool: PgPool,
}

impl PgKycStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KycStore for PgKycStore {
    async fn insert(&self, document: &NewKycDocument) -> Result<i64, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO kyc_documents
                (user_id, document_type, document_number, front_image, back_image, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(document.user_id)
        .bind(document.document_type.as_str())
        .bind(&document.document_number)
        .bind(&document.front_image)
        .bind(&document.back_image)
        .bind(ReviewStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}
