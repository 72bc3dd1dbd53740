use axum::http::{header, HeaderMap};
use serde_json::{Map, Value};

use crate::validation::parse_flag;

/// Loosely-typed request fields from a JSON, urlencoded or multipart body.
///
/// Malformed bodies yield an empty set so handlers report missing fields
/// rather than parse errors.
#[derive(Debug, Clone, Default)]
pub struct RequestFields(Map<String, Value>);

impl RequestFields {
    /// Parse by content type; anything that is not a urlencoded form is tried as JSON
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/x-www-form-urlencoded") {
            Self::from_form(body)
        } else {
            Self::from_json(body)
        }
    }

    pub fn from_json(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self(map),
            Ok(_) => Self::default(),
            Err(e) => {
                if !body.is_empty() {
                    tracing::debug!("Ignoring malformed JSON body: {}", e);
                }
                Self::default()
            }
        }
    }

    pub fn from_form(body: &[u8]) -> Self {
        let map = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Self(map)
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    /// String value of a field; scalars are stringified, other shapes count as absent
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Trimmed, non-empty string value
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.text(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Checkbox-style flag; absent means false
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(parse_flag)
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.text("csrf_token")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn malformed_json_is_treated_as_empty() {
        let fields = RequestFields::from_json(b"{\"full_name\": ");
        assert!(fields.is_empty());
        assert_eq!(fields.text("full_name"), None);

        let fields = RequestFields::from_json(b"[1, 2, 3]");
        assert!(fields.is_empty());
    }

    #[test]
    fn scalars_are_read_as_text() {
        let fields = RequestFields::from_json(br#"{"phone": 639170000000, "name": "Jane", "tags": ["a"]}"#);
        assert_eq!(fields.text("phone").as_deref(), Some("639170000000"));
        assert_eq!(fields.text("name").as_deref(), Some("Jane"));
        assert_eq!(fields.text("tags"), None);
    }

    #[test]
    fn urlencoded_bodies_are_decoded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let fields = RequestFields::from_body(&headers, b"full_name=Jane+Cruz&email_notifications=on");
        assert_eq!(fields.text("full_name").as_deref(), Some("Jane Cruz"));
        assert!(fields.flag("email_notifications"));
        assert!(!fields.flag("sms_notifications"));
    }

    #[test]
    fn non_empty_trims_blank_values() {
        let fields = RequestFields::from_json(br#"{"session_id": "   "}"#);
        assert_eq!(fields.non_empty("session_id"), None);
    }
}
