use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{Session, User};
use crate::types::KycStatus;

/// Public view of the caller's account
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub kyc_status: KycStatus,
    pub member_since: DateTime<Utc>,
}

impl ProfileView {
    /// `avatar_url` is resolved by the caller from the stored image reference
    pub fn new(user: &User, avatar_url: Option<String>) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar_url,
            kyc_status: user.kyc_status,
            member_since: user.created_at,
        }
    }
}

/// One row of the "active sessions" list
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_current: bool,
}

impl SessionView {
    pub fn new(session: Session, current_session_id: &str) -> Self {
        let is_current = session.id == current_session_id;
        Self {
            id: session.id,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            last_activity: session.last_activity,
            created_at: session.created_at,
            is_current,
        }
    }
}

/// Convert a list of sessions, flagging the one issuing the request
pub fn sessions_to_views(sessions: Vec<Session>, current_session_id: &str) -> Vec<SessionView> {
    sessions
        .into_iter()
        .map(|s| SessionView::new(s, current_session_id))
        .collect()
}
