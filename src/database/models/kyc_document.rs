use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{DocumentType, ReviewStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KycDocument {
    pub id: i64,
    pub user_id: i64,
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub front_image: String,
    pub back_image: Option<String>,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A freshly uploaded document; always inserted as `pending`
#[derive(Debug, Clone)]
pub struct NewKycDocument {
    pub user_id: i64,
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub front_image: String,
    pub back_image: Option<String>,
}
