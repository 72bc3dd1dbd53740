use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use serde_json::json;

use crate::api::format::{sessions_to_views, SessionView};
use crate::database::models::{AuditAction, AuditEntry};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;

use super::utils::{guarded_fields, record_audit};

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionView>,
}

/// GET /api/profile/sessions - the caller's live sessions, most recent first
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> ApiResult<SessionList> {
    let sessions = state
        .sessions
        .list_for_user(ctx.user_id())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to load sessions"))?;

    Ok(ApiResponse::success(SessionList {
        sessions: sessions_to_views(sessions, &ctx.session_id),
    }))
}

/// POST /api/profile/sessions/terminate - end one of the caller's other sessions
pub async fn terminate(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<()> {
    let fields = guarded_fields(&ctx, &headers, &body)?;

    let session_id = fields
        .non_empty("session_id")
        .ok_or_else(|| ApiError::validation("Session ID is required"))?;

    if session_id == ctx.session_id {
        return Err(ApiError::validation("Cannot terminate your current session"));
    }

    let target = state
        .sessions
        .find(&session_id)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to terminate session"))?
        .ok_or_else(|| ApiError::not_found("Session not found"))?;

    if target.user_id != ctx.user_id() {
        tracing::warn!(
            user_id = %ctx.user_id(),
            owner_id = %target.user_id,
            "Attempt to terminate another user's session"
        );
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let deleted = state
        .sessions
        .delete_owned(&session_id, ctx.user_id())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to terminate session"))?;
    if !deleted {
        // Expired or terminated elsewhere in the meantime
        return Err(ApiError::not_found("Session not found"));
    }

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(ctx.user_id(), AuditAction::SessionTerminate, "sessions")
            .record(&session_id)
            .metadata(json!({ "terminated_session_id": session_id })),
    )
    .await;

    tracing::info!(user_id = %ctx.user_id(), session_id = %session_id, "Session terminated");

    Ok(ApiResponse::message("Session terminated successfully"))
}
