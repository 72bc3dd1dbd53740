use serde::Serialize;

/// A user-facing message queued for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub user_id: i64,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(user_id: i64, kind: &'static str, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}
