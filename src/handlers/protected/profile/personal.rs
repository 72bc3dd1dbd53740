use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde_json::json;

use crate::database::models::{AuditAction, AuditEntry, PersonalInfoUpdate};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;
use crate::validation::{
    sanitize_optional, validate_email_format, validate_phone_format, MAX_NAME_CHARS,
};

use super::utils::{guarded_fields, record_audit, refresh_session_identity};

const UPDATE_FAILED: &str = "Failed to update profile";

/// POST /api/profile/personal - update name, email and phone
///
/// A changed email must not belong to another account. No re-verification
/// of the new address is triggered.
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<()> {
    let fields = guarded_fields(&ctx, &headers, &body)?;

    let full_name = sanitize_optional(fields.text("full_name").as_deref(), MAX_NAME_CHARS)
        .ok_or_else(|| ApiError::validation("Full name is required"))?;

    let email = fields
        .non_empty("email")
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ApiError::validation("Email is required"))?;
    validate_email_format(&email).map_err(ApiError::validation)?;

    let phone = fields.non_empty("phone");
    if let Some(phone) = &phone {
        validate_phone_format(phone).map_err(ApiError::validation)?;
    }

    let user = &ctx.user;
    let email_changed = !email.eq_ignore_ascii_case(&user.email);

    if email_changed {
        let taken = state
            .users
            .email_in_use_by_other(&email, user.id)
            .await
            .map_err(|e| ApiError::storage(e, UPDATE_FAILED))?;
        if taken {
            return Err(ApiError::conflict("Email already in use"));
        }
    }

    let update = PersonalInfoUpdate {
        full_name,
        email,
        phone,
    };

    match state.users.update_personal_info(user.id, &update).await {
        Ok(()) => {}
        // Lost a race with another account claiming the same address
        Err(StoreError::UniqueViolation(_)) => return Err(ApiError::conflict("Email already in use")),
        Err(e) => return Err(ApiError::storage(e, UPDATE_FAILED)),
    }

    let mut changed = Vec::new();
    if update.full_name != user.full_name {
        changed.push("full_name");
    }
    if email_changed {
        changed.push("email");
    }
    if update.phone != user.phone {
        changed.push("phone");
    }

    refresh_session_identity(&state, &ctx, &update.full_name, &update.email, user.kyc_status).await;

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(user.id, AuditAction::ProfileUpdate, "users")
            .record(user.id)
            .metadata(json!({ "changed_fields": changed })),
    )
    .await;

    tracing::info!(user_id = %user.id, changed = ?changed, "Profile updated");

    Ok(ApiResponse::message("Profile updated successfully"))
}
