use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::api::RequestFields;
use crate::error::ApiError;

use super::RequestContext;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Token from the submitted fields, else the `X-CSRF-Token` header
pub fn submitted_token(fields: &RequestFields, headers: &HeaderMap) -> Option<String> {
    fields.csrf_token().or_else(|| {
        headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// Require the session's CSRF token. Checked before any state changes.
pub fn verify_csrf(ctx: &RequestContext, submitted: Option<&str>) -> Result<(), ApiError> {
    match submitted {
        Some(token) if tokens_match(&ctx.csrf_token, token) => Ok(()),
        _ => {
            tracing::warn!(user_id = %ctx.user_id(), "CSRF token missing or invalid");
            Err(ApiError::InvalidCsrf)
        }
    }
}

/// Compare digests so the comparison time does not depend on where the tokens differ
fn tokens_match(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(submitted.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tokens() {
        assert!(tokens_match("csrf-abc", "csrf-abc"));
        assert!(!tokens_match("csrf-abc", "csrf-abd"));
        assert!(!tokens_match("csrf-abc", ""));
        // A session without a token never validates
        assert!(!tokens_match("", ""));
    }

    #[test]
    fn header_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, "from-header".parse().unwrap());

        let empty = RequestFields::default();
        assert_eq!(submitted_token(&empty, &headers).as_deref(), Some("from-header"));

        let fields = RequestFields::from_json(br#"{"csrf_token": "from-body"}"#);
        assert_eq!(submitted_token(&fields, &headers).as_deref(), Some("from-body"));
    }
}
