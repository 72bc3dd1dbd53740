//! In-memory collaborators for driving the router without a database.
//!
//! `MemoryStore` implements every store trait over one mutex-guarded state so
//! tests can seed rows, inject failures and inspect what the handlers wrote.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::auth::password::{CredentialService, PasswordChange, PasswordCheck, PasswordPolicy};
use crate::database::models::{
    AuditEntry, KycAdvance, KycDocument, NewKycDocument, Notification, PersonalInfoUpdate,
    Preferences, Session, SessionIdentity, User,
};
use crate::database::{
    AuditLog, KycStore, Notifier, PreferencesStore, SessionStore, StoreError, UserStore,
};
use crate::types::{KycStatus, ReviewStatus, UserRole};
use crate::uploads::{UploadBackend, UploadError};

/// Failure switches for exercising error paths
#[derive(Debug, Default)]
pub struct Failures {
    pub email_lookup: AtomicBool,
    pub personal_info: AtomicBool,
    pub profile_image: AtomicBool,
    pub kyc_status: AtomicBool,
    pub ping: AtomicBool,
    pub kyc_insert: AtomicBool,
    pub preferences: AtomicBool,
    pub audit: AtomicBool,
    pub notifications: AtomicBool,
}

impl Failures {
    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("injected {} failure", what)));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<i64, User>,
    sessions: HashMap<String, Session>,
    preferences: HashMap<i64, Preferences>,
    kyc_documents: Vec<KycDocument>,
    audit: Vec<AuditEntry>,
    notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pub fail: Failures,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    pub fn insert_session(&self, session: Session) {
        self.lock().sessions.insert(session.id.clone(), session);
    }

    pub fn remove_session(&self, id: &str) {
        self.lock().sessions.remove(id);
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        self.lock().sessions.get(id).cloned()
    }

    pub fn stored_preferences(&self, user_id: i64) -> Option<Preferences> {
        self.lock().preferences.get(&user_id).cloned()
    }

    pub fn preferences_rows(&self) -> usize {
        self.lock().preferences.len()
    }

    pub fn kyc_documents(&self) -> Vec<KycDocument> {
        self.lock().kyc_documents.clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock().audit.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Replace the hash only if it still equals `expected`
    pub fn swap_password_hash(&self, user_id: i64, expected: &str, new_hash: String) -> bool {
        let mut state = self.lock();
        match state.users.get_mut(&user_id) {
            Some(user) if user.password_hash == expected => {
                user.password_hash = new_hash;
                user.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.user(id))
    }

    async fn email_in_use_by_other(&self, email: &str, user_id: i64) -> Result<bool, StoreError> {
        Failures::check(&self.fail.email_lookup, "email lookup")?;
        let state = self.lock();
        Ok(state
            .users
            .values()
            .any(|u| u.id != user_id && u.email.eq_ignore_ascii_case(email)))
    }

    async fn update_personal_info(&self, id: i64, update: &PersonalInfoUpdate) -> Result<(), StoreError> {
        Failures::check(&self.fail.personal_info, "user update")?;
        let mut state = self.lock();
        if state
            .users
            .values()
            .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&update.email))
        {
            return Err(StoreError::UniqueViolation("users_email_lower_key".to_string()));
        }
        if let Some(user) = state.users.get_mut(&id) {
            user.full_name = update.full_name.clone();
            user.email = update.email.clone();
            user.phone = update.phone.clone();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn replace_profile_image(&self, id: i64, reference: &str) -> Result<Option<String>, StoreError> {
        Failures::check(&self.fail.profile_image, "profile image update")?;
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("user {} not found", id)))?;
        user.updated_at = Utc::now();
        Ok(user.profile_image.replace(reference.to_string()))
    }

    async fn advance_kyc_status(&self, id: i64) -> Result<KycAdvance, StoreError> {
        Failures::check(&self.fail.kyc_status, "KYC status update")?;
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("user {} not found", id)))?;
        if user.kyc_status == KycStatus::None {
            user.kyc_status = KycStatus::Pending;
            return Ok(KycAdvance {
                status: KycStatus::Pending,
                advanced: true,
            });
        }
        Ok(KycAdvance {
            status: user.kyc_status,
            advanced: false,
        })
    }

    async fn admin_ids(&self) -> Result<Vec<i64>, StoreError> {
        let state = self.lock();
        let mut ids: Vec<i64> = state
            .users
            .values()
            .filter(|u| u.role == UserRole::Admin && u.is_active())
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Failures::check(&self.fail.ping, "ping")
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.session(id))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Session>, StoreError> {
        let now = Utc::now();
        let state = self.lock();
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && !s.is_expired(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(sessions)
    }

    async fn delete_owned(&self, id: &str, user_id: i64) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let owned = state.sessions.get(id).is_some_and(|s| s.user_id == user_id);
        if owned {
            state.sessions.remove(id);
        }
        Ok(owned)
    }

    async fn touch(&self, id: &str) -> Result<(), StoreError> {
        if let Some(session) = self.lock().sessions.get_mut(id) {
            session.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn refresh_identity(&self, id: &str, identity: &SessionIdentity) -> Result<(), StoreError> {
        if let Some(session) = self.lock().sessions.get_mut(id) {
            session.cached_name = Some(identity.full_name.clone());
            session.cached_email = Some(identity.email.clone());
            session.cached_kyc_status = Some(identity.kyc_status);
        }
        Ok(())
    }
}

#[async_trait]
impl PreferencesStore for MemoryStore {
    async fn find(&self, user_id: i64) -> Result<Option<Preferences>, StoreError> {
        Failures::check(&self.fail.preferences, "preferences lookup")?;
        Ok(self.stored_preferences(user_id))
    }

    async fn upsert(&self, user_id: i64, preferences: &Preferences) -> Result<(), StoreError> {
        Failures::check(&self.fail.preferences, "preferences upsert")?;
        self.lock().preferences.insert(user_id, preferences.clone());
        Ok(())
    }
}

#[async_trait]
impl KycStore for MemoryStore {
    async fn insert(&self, document: &NewKycDocument) -> Result<i64, StoreError> {
        Failures::check(&self.fail.kyc_insert, "KYC insert")?;
        let mut state = self.lock();
        let id = state.kyc_documents.len() as i64 + 1;
        let now = Utc::now();
        state.kyc_documents.push(KycDocument {
            id,
            user_id: document.user_id,
            document_type: document.document_type,
            document_number: document.document_number.clone(),
            front_image: document.front_image.clone(),
            back_image: document.back_image.clone(),
            status: ReviewStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn record(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        Failures::check(&self.fail.audit, "audit")?;
        self.lock().audit.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl Notifier for MemoryStore {
    async fn send(&self, notification: &Notification) -> Result<(), StoreError> {
        Failures::check(&self.fail.notifications, "notification")?;
        self.lock().notifications.push(notification.clone());
        Ok(())
    }
}

/// Credential service over `MemoryStore` using the real bcrypt policy
pub struct MemoryCredentialService {
    store: Arc<MemoryStore>,
    policy: PasswordPolicy,
}

impl MemoryCredentialService {
    pub fn new(store: Arc<MemoryStore>, policy: PasswordPolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait]
impl CredentialService for MemoryCredentialService {
    async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new: &str,
    ) -> Result<PasswordChange, StoreError> {
        let Some(user) = self.store.user(user_id) else {
            return Ok(PasswordChange::refused("User not found"));
        };

        let check = self
            .policy
            .evaluate_blocking(user.password_hash.clone(), current.to_string(), new.to_string())
            .await?;
        match check {
            PasswordCheck::Accepted { new_hash } => {
                if self.store.swap_password_hash(user_id, &user.password_hash, new_hash) {
                    Ok(PasswordChange::changed())
                } else {
                    Ok(PasswordChange::refused(
                        "Password was changed by another request, please try again",
                    ))
                }
            }
            PasswordCheck::Refused(reason) => Ok(PasswordChange::refused(reason)),
        }
    }
}

/// Upload backend that fails writes whose reference contains `pattern`
pub struct FlakyBackend {
    inner: Arc<dyn UploadBackend>,
    pattern: String,
}

impl FlakyBackend {
    pub fn new(inner: Arc<dyn UploadBackend>, pattern: impl Into<String>) -> Self {
        Self {
            inner,
            pattern: pattern.into(),
        }
    }
}

#[async_trait]
impl UploadBackend for FlakyBackend {
    async fn put(&self, reference: &str, data: &[u8]) -> Result<(), UploadError> {
        if reference.contains(&self.pattern) {
            return Err(UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        self.inner.put(reference, data).await
    }

    async fn delete(&self, reference: &str) -> Result<(), UploadError> {
        self.inner.delete(reference).await
    }

    async fn exists(&self, reference: &str) -> bool {
        self.inner.exists(reference).await
    }

    fn public_url(&self, reference: &str) -> String {
        self.inner.public_url(reference)
    }
}

/// An active account with defaults for everything but identity
pub fn sample_user(id: i64, full_name: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        id,
        full_name: full_name.to_string(),
        email: email.to_string(),
        phone: None,
        password_hash: String::new(),
        profile_image: None,
        kyc_status: KycStatus::None,
        role: UserRole::User,
        status: "active".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// A live session expiring in a day
pub fn sample_session(id: &str, user_id: i64, csrf_token: &str) -> Session {
    let now = Utc::now();
    Session {
        id: id.to_string(),
        user_id,
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("test-agent".to_string()),
        csrf_token: csrf_token.to_string(),
        cached_name: None,
        cached_email: None,
        cached_kyc_status: None,
        last_activity: now,
        expires_at: Some(now + Duration::days(1)),
        created_at: now,
    }
}
