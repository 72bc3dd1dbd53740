use axum::{body::Bytes, extract::State, http::HeaderMap};

use crate::database::models::{AuditAction, AuditEntry};
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;

use super::utils::{guarded_fields, record_audit};

/// POST /api/profile/password - change the account password
pub async fn change(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<()> {
    let fields = guarded_fields(&ctx, &headers, &body)?;

    let current = fields.text("current_password").filter(|p| !p.is_empty());
    let new = fields.text("new_password").filter(|p| !p.is_empty());
    let (current, new) = match (current, new) {
        (Some(current), Some(new)) => (current, new),
        _ => return Err(ApiError::validation("Current and new password are required")),
    };

    if let Some(confirm) = fields.text("confirm_password") {
        if confirm != new {
            return Err(ApiError::validation("New passwords do not match"));
        }
    }

    let outcome = state
        .credentials
        .change_password(ctx.user_id(), &current, &new)
        .await
        .map_err(|e| ApiError::storage(e, GENERIC_FAILURE))?;

    if !outcome.success {
        let reason = outcome
            .reason
            .unwrap_or_else(|| "Password change failed".to_string());
        tracing::warn!(user_id = %ctx.user_id(), "Password change refused: {}", reason);
        return Err(ApiError::validation(reason));
    }

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(ctx.user_id(), AuditAction::PasswordChange, "users").record(ctx.user_id()),
    )
    .await;

    tracing::info!(user_id = %ctx.user_id(), "Password changed");

    Ok(ApiResponse::message("Password changed successfully"))
}
