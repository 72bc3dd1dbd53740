pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod testing;
pub mod types;
pub mod uploads;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn_with_state, map_response},
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use handlers::{method_not_allowed, route_not_found};
use handlers::protected::profile;
use middleware::{envelope_rejections, session_auth_middleware};
use state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected profile API
        .merge(profile_routes(state.clone()))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(state.http.max_body_bytes))
        .layer(map_response(envelope_rejections));

    if state.http.enable_cors {
        router = router.layer(cors_layer(&state.http.cors_origins));
    }
    if state.http.request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/profile", guarded(&state, get(profile::profile_show)))
        .route("/api/profile/personal", guarded(&state, post(profile::personal_update)))
        .route("/api/profile/password", guarded(&state, post(profile::password_change)))
        .route("/api/profile/sessions", guarded(&state, get(profile::sessions_list)))
        .route(
            "/api/profile/sessions/terminate",
            guarded(&state, post(profile::session_terminate)),
        )
        .route(
            "/api/profile/preferences",
            guarded(
                &state,
                get(profile::preferences_show).post(profile::preferences_update),
            ),
        )
        .route("/api/profile/avatar", guarded(&state, post(profile::avatar_upload)))
        .route("/api/profile/kyc", guarded(&state, post(profile::kyc_upload)))
}

/// Wrap a profile route so session authentication runs before method
/// dispatch. `MethodRouter::layer` also covers the 405 fallback, so a bad
/// verb from an anonymous caller is still a 401.
fn guarded(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .fallback(method_not_allowed)
        .layer(from_fn_with_state(state.clone(), session_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(middleware::csrf::CSRF_HEADER),
        ])
        .allow_credentials(true)
}
