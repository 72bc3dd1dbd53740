use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{KycStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub kyc_status: KycStatus,
    pub role: UserRole,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Sanitized personal-info fields written by the profile form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalInfoUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Result of the conditional `none -> pending` KYC transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KycAdvance {
    pub status: KycStatus,
    pub advanced: bool,
}
