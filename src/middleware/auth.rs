use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Everything a profile handler knows about the caller
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user: User,
    pub session_id: String,
    pub csrf_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))
    }
}

/// Session authentication: verifies the signed handle, then requires a live
/// session row owned by the token subject and an active user
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();
    let token = extract_session_token(headers, state.tokens.cookie_name())
        .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::unauthenticated("Invalid or expired session")
    })?;

    let session = state
        .sessions
        .find(&claims.sid)
        .await?
        .filter(|s| s.user_id == claims.sub && !s.is_expired(Utc::now()))
        .ok_or_else(|| ApiError::unauthenticated("Invalid or expired session"))?;

    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| ApiError::unauthenticated("Account is not active"))?;

    if let Err(e) = state.sessions.touch(&session.id).await {
        tracing::warn!(session_id = %session.id, "Failed to update session activity: {}", e);
    }

    let context = RequestContext {
        ip_address: client_ip(&request),
        user_agent: header_text(request.headers(), header::USER_AGENT.as_str()),
        user,
        session_id: session.id,
        csrf_token: session.csrf_token,
    };
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Bearer token first, then the session cookie
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth) = header_text(headers, header::AUTHORIZATION.as_str()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First `X-Forwarded-For` hop, else the peer address
fn client_ip(request: &Request) -> Option<String> {
    let forwarded = header_text(request.headers(), "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}
