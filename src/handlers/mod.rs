// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (session auth, CSRF on mutations)

pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Method fallback for every route: the standard envelope instead of axum's empty 405
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Router fallback for unknown paths
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Not found")
}
