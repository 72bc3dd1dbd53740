//! PostgreSQL-backed collaborators

mod audit;
mod credentials;
mod kyc;
mod notifications;
mod preferences;
mod sessions;
mod users;

pub use audit::PgAuditLog;
pub use credentials::PgCredentialService;
pub use kyc::PgKycStore;
pub use notifications::PgNotifier;
pub use preferences::PgPreferencesStore;
pub use sessions::PgSessionStore;
pub use users::PgUserStore;
