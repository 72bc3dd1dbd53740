use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use serde_json::json;

use crate::database::models::{AuditAction, AuditEntry};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;
use crate::uploads::{avatar_reference, sha256_hex, FileSaga, UploadError};

use super::utils::{guarded_form, record_audit};

#[derive(Debug, Serialize)]
pub struct AvatarUpdated {
    pub avatar_url: String,
}

/// POST /api/profile/avatar - replace the profile image (multipart field `avatar`)
///
/// The new file is written before the user row points at it, and the previous
/// file is removed only once the row update succeeded.
pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<AvatarUpdated> {
    let mut form = guarded_form(&ctx, &headers, body).await?;

    let file = form
        .take_file("avatar")
        .ok_or_else(|| UploadError::Missing("No file uploaded".to_string()))?;
    let kind = state.avatar_policy.validate(&file)?;

    let reference = avatar_reference(ctx.user_id(), &kind.extension_for(file.file_name.as_deref()));

    let mut saga = FileSaga::new(state.uploads.clone());
    saga.write(reference.clone(), &file.bytes).await?;

    let previous = saga
        .finish(state.users.replace_profile_image(ctx.user_id(), &reference))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to update avatar"))?;

    if let Some(old) = previous.filter(|old| *old != reference) {
        if let Err(e) = state.uploads.delete(&old).await {
            tracing::warn!(user_id = %ctx.user_id(), reference = %old, "Failed to remove previous avatar: {}", e);
        }
    }

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(ctx.user_id(), AuditAction::AvatarUpdate, "users")
            .record(ctx.user_id())
            .metadata(json!({
                "file": reference,
                "content_type": kind.mime(),
                "size": file.bytes.len(),
                "sha256": sha256_hex(&file.bytes),
            })),
    )
    .await;

    tracing::info!(user_id = %ctx.user_id(), reference = %reference, "Avatar updated");

    Ok(ApiResponse::success(AvatarUpdated {
        avatar_url: state.uploads.public_url(&reference),
    })
    .with_message("Avatar updated successfully"))
}
