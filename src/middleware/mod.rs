pub mod auth;
pub mod csrf;
pub mod response;

pub use auth::{session_auth_middleware, RequestContext};
pub use csrf::{submitted_token, verify_csrf};
pub use response::{envelope_rejections, ApiResponse, ApiResult};
