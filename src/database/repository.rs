//! Persistence seams consumed by the profile handlers.
//!
//! Postgres implementations live in `database::pg`; `crate::testing` has
//! in-memory ones.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    AuditEntry, KycAdvance, NewKycDocument, Notification, PersonalInfoUpdate, Preferences, Session,
    SessionIdentity, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Sqlx(err)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Whether any user other than `user_id` holds `email` (case-insensitive)
    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, StoreError>;

    async fn update_personal_info(&self, id: i64, update: &PersonalInfoUpdate) -> Result<(), StoreError>;

    /// Point the user at a new profile image and return the reference it replaced
    async fn replace_profile_image(&self, id: i64, reference: &str) -> Result<Option<String>, StoreError>;

    /// Move `kyc_status` from `none` to `pending`; any other status is left alone
    async fn advance_kyc_status(&self, id: i64) -> Result<KycAdvance, StoreError>;

    /// Ids of active administrator accounts
    async fn admin_ids(&self) -> Result<Vec<i64>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Session>, StoreError>;

    /// Delete a session only if `user_id` owns it; returns whether a row went away
    async fn delete_owned(&self, id: &str, user_id: i64) -> Result<bool, StoreError>;

    async fn touch(&self, id: &str) -> Result<(), StoreError>;

    async fn refresh_identity(&self, id: &str, identity: &SessionIdentity) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn find(&self, user_id: i64) -> Result<Option<Preferences>, StoreError>;

    /// Insert or fully replace the user's single preferences record
    async fn upsert(&self, user_id: i64, preferences: &Preferences) -> Result<(), StoreError>;
}

#[async_trait]
pub trait KycStore: Send + Sync {
    /// Insert a `pending` document and return its id
    async fn insert(&self, document: &NewKycDocument) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), StoreError>;
}
