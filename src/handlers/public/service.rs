use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "LandTrade Profile API",
            "version": version,
            "endpoints": {
                "profile": "GET /api/profile",
                "personal": "POST /api/profile/personal",
                "password": "POST /api/profile/password",
                "sessions": "GET /api/profile/sessions, POST /api/profile/sessions/terminate",
                "preferences": "GET|POST /api/profile/preferences",
                "avatar": "POST /api/profile/avatar (multipart)",
                "kyc": "POST /api/profile/kyc (multipart)",
            }
        }
    }))
}

/// GET /health - database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.users.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
