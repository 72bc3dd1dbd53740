use serde::Serialize;
use serde_json::Value;

/// Action tags written to the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ProfileUpdate,
    PasswordChange,
    SessionTerminate,
    PreferencesUpdate,
    AvatarUpdate,
    KycUpload,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ProfileUpdate => "profile_update",
            AuditAction::PasswordChange => "password_change",
            AuditAction::SessionTerminate => "session_terminate",
            AuditAction::PreferencesUpdate => "preferences_update",
            AuditAction::AvatarUpdate => "avatar_update",
            AuditAction::KycUpload => "kyc_upload",
        }
    }
}

/// One append-only audit record: who did what to what
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub user_id: i64,
    pub action: AuditAction,
    pub table_name: &'static str,
    pub record_id: Option<String>,
    pub metadata: Option<Value>,
    pub ip_address: Option<String>,
}

impl AuditEntry {
    pub fn new(user_id: i64, action: AuditAction, table_name: &'static str) -> Self {
        Self {
            user_id,
            action,
            table_name,
            record_id: None,
            metadata: None,
            ip_address: None,
        }
    }

    pub fn record(mut self, id: impl ToString) -> Self {
        self.record_id = Some(id.to_string());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn from_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}
