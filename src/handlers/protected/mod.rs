// handlers/protected/mod.rs - Protected handlers (session authentication required)
//
// Every route here sits behind `session_auth_middleware`, which injects the
// `RequestContext`. Mutations additionally check the session's CSRF token
// before touching any state.

pub mod profile;

pub use profile::*;
