use axum::extract::State;
use serde::Serialize;

use crate::api::ProfileView;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfilePayload {
    pub profile: ProfileView,
    pub csrf_token: String,
}

/// GET /api/profile - current profile plus the CSRF token for later mutations
pub async fn show(State(state): State<AppState>, ctx: RequestContext) -> ApiResult<ProfilePayload> {
    let avatar_url = ctx
        .user
        .profile_image
        .as_deref()
        .map(|reference| state.uploads.public_url(reference));

    Ok(ApiResponse::success(ProfilePayload {
        profile: ProfileView::new(&ctx.user, avatar_url),
        csrf_token: ctx.csrf_token.clone(),
    }))
}
