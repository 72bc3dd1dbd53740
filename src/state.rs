use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{CredentialService, PasswordPolicy, SessionTokens};
use crate::config::AppConfig;
use crate::database::pg::{
    PgAuditLog, PgCredentialService, PgKycStore, PgNotifier, PgPreferencesStore, PgSessionStore,
    PgUserStore,
};
use crate::database::{AuditLog, KycStore, Notifier, PreferencesStore, SessionStore, UserStore};
use crate::uploads::{UploadBackend, UploadPolicy};

/// Router-level HTTP settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub max_body_bytes: usize,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub request_logging: bool,
}

impl HttpSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_body_bytes: config.api.max_request_size_bytes,
            enable_cors: config.security.enable_cors,
            cors_origins: config.security.cors_origins.clone(),
            request_logging: config.api.enable_request_logging,
        }
    }
}

/// Collaborators shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub preferences: Arc<dyn PreferencesStore>,
    pub kyc: Arc<dyn KycStore>,
    pub audit: Arc<dyn AuditLog>,
    pub notifier: Arc<dyn Notifier>,
    pub credentials: Arc<dyn CredentialService>,
    pub uploads: Arc<dyn UploadBackend>,
    pub tokens: SessionTokens,
    pub avatar_policy: UploadPolicy,
    pub kyc_policy: UploadPolicy,
    pub http: HttpSettings,
}

impl AppState {
    /// Wire the Postgres collaborators around an initialized upload backend
    pub fn postgres(pool: PgPool, config: &AppConfig, uploads: Arc<dyn UploadBackend>) -> Self {
        let policy = PasswordPolicy::new(config.security.bcrypt_cost);

        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            preferences: Arc::new(PgPreferencesStore::new(pool.clone())),
            kyc: Arc::new(PgKycStore::new(pool.clone())),
            audit: Arc::new(PgAuditLog::new(pool.clone())),
            notifier: Arc::new(PgNotifier::new(pool.clone())),
            credentials: Arc::new(PgCredentialService::new(pool, policy)),
            uploads,
            tokens: SessionTokens::new(
                config.security.session_secret.clone(),
                config.security.session_cookie.clone(),
            ),
            avatar_policy: UploadPolicy::avatar(config.uploads.max_avatar_bytes),
            kyc_policy: UploadPolicy::kyc(config.uploads.max_kyc_bytes),
            http: HttpSettings::from_config(config),
        }
    }
}
