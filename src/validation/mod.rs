//! Input checks shared by the profile forms

use serde_json::Value;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_DOCUMENT_NUMBER_CHARS: usize = 50;

/// Trim, drop control characters and markup brackets, cap the length
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Sanitize an optional field, mapping blank input to `None`
pub fn sanitize_optional(input: Option<&str>, max_chars: usize) -> Option<String> {
    input
        .map(|s| sanitize_text(s, max_chars))
        .filter(|s| !s.is_empty())
}

/// Validate email format
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err("Email is too long".to_string());
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| "Invalid email format".to_string())?;

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return Err("Invalid email format".to_string());
    }

    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-'".contains(c));
    if !local_ok || local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err("Invalid email format".to_string());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("Invalid email format".to_string());
    }
    for label in &labels {
        let label_ok = !label.is_empty()
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !label_ok {
            return Err("Invalid email format".to_string());
        }
    }

    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Phone numbers: digits with common separators, 7 to 20 characters
pub fn validate_phone_format(phone: &str) -> Result<(), String> {
    let len = phone.chars().count();
    if !(7..=20).contains(&len) {
        return Err("Phone number must be between 7 and 20 characters".to_string());
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
    {
        return Err("Phone number contains invalid characters".to_string());
    }

    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 7 {
        return Err("Phone number must contain at least 7 digits".to_string());
    }

    Ok(())
}

/// Lenient checkbox semantics: `true`, non-zero numbers, and
/// "1"/"true"/"on"/"yes" are set; anything else is unset
pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}
