use axum::body::Bytes;
use axum::http::HeaderMap;

use crate::api::RequestFields;
use crate::database::models::{AuditEntry, Notification, SessionIdentity};
use crate::error::ApiError;
use crate::middleware::{submitted_token, verify_csrf, RequestContext};
use crate::state::AppState;
use crate::types::KycStatus;
use crate::uploads::{parse_form, FormData};

/// Parse a JSON or urlencoded body and check its CSRF token
pub fn guarded_fields(ctx: &RequestContext, headers: &HeaderMap, body: &[u8]) -> Result<RequestFields, ApiError> {
    let fields = RequestFields::from_body(headers, body);
    verify_csrf(ctx, submitted_token(&fields, headers).as_deref())?;
    Ok(fields)
}

/// Parse a multipart body and check its CSRF token
pub async fn guarded_form(ctx: &RequestContext, headers: &HeaderMap, body: Bytes) -> Result<FormData, ApiError> {
    let form = parse_form(headers, body).await;
    verify_csrf(ctx, submitted_token(&form.fields, headers).as_deref())?;
    Ok(form)
}

/// Append an audit record. A failed audit write never fails the request.
pub async fn record_audit(state: &AppState, ctx: &RequestContext, entry: AuditEntry) {
    let entry = entry.from_ip(ctx.ip_address.clone());
    if let Err(e) = state.audit.record(&entry).await {
        tracing::warn!(
            user_id = %entry.user_id,
            action = entry.action.as_str(),
            "Failed to write audit record: {}",
            e
        );
    }
}

/// Update the identity snapshot on the caller's session
pub async fn refresh_session_identity(
    state: &AppState,
    ctx: &RequestContext,
    full_name: &str,
    email: &str,
    kyc_status: KycStatus,
) {
    let identity = SessionIdentity {
        full_name: full_name.to_string(),
        email: email.to_string(),
        kyc_status,
    };
    if let Err(e) = state.sessions.refresh_identity(&ctx.session_id, &identity).await {
        tracing::warn!(session_id = %ctx.session_id, "Failed to refresh session identity: {}", e);
    }
}

/// Queue one notification per active administrator; returns how many were sent
pub async fn notify_admins(state: &AppState, kind: &'static str, title: &str, message: &str) -> usize {
    let admins = match state.users.admin_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(kind, "Failed to look up administrators for notification: {}", e);
            return 0;
        }
    };

    let mut sent = 0;
    for admin_id in admins {
        let notification = Notification::new(admin_id, kind, title, message);
        match state.notifier.send(&notification).await {
            Ok(()) => sent += 1,
            Err(e) => tracing::warn!(admin_id, kind, "Failed to queue notification: {}", e),
        }
    }
    sent
}
