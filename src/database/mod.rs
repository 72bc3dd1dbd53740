pub mod manager;
pub mod models;
pub mod pg;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{
    AuditLog, KycStore, Notifier, PreferencesStore, SessionStore, StoreError, UserStore,
};
