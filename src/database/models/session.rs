use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::KycStatus;

/// A login session. Rows are created by the login flow; this service reads,
/// refreshes and deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(skip_serializing)]
    pub csrf_token: String,
    pub cached_name: Option<String>,
    pub cached_email: Option<String>,
    pub cached_kyc_status: Option<KycStatus>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Identity snapshot a session carries for page rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub full_name: String,
    pub email: String,
    pub kyc_status: KycStatus,
}
