use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::database::models::AuditEntry;
use crate::database::repository::{AuditLog, StoreError};

#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, table_name, record_id, metadata, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.table_name)
        .bind(&entry.record_id)
        .bind(entry.metadata.as_ref().map(Json))
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
