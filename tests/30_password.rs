mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, PASSWORD};

const PATH: &str = "/api/profile/password";

#[tokio::test]
async fn successful_change_replaces_the_hash() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_json(
            PATH,
            &login,
            json!({
                "csrf_token": login.csrf_token,
                "current_password": PASSWORD,
                "new_password": "a-much-better-password",
                "confirm_password": "a-much-better-password",
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Password changed successfully"}));

    let hash = app.store.user(1).unwrap().password_hash;
    assert!(bcrypt::verify("a-much-better-password", &hash)?);
    assert!(!bcrypt::verify(PASSWORD, &hash)?);

    let audit = app.store.audit_entries();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action.as_str(), "password_change");
    Ok(())
}

#[tokio::test]
async fn wrong_current_password_is_refused_without_changes() -> Result<()> {
    let app = TestApp::new();
    let before = app.seed_user(1, "Ana Reyes", "ana@example.com").password_hash;
    let login = app.login(1);

    let (status, body) = app
        .post_json(
            PATH,
            &login,
            json!({
                "csrf_token": login.csrf_token,
                "current_password": "not-my-password",
                "new_password": "a-much-better-password",
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Current password is incorrect"}));
    assert_eq!(app.store.user(1).unwrap().password_hash, before);
    assert!(app.store.audit_entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn policy_violations_are_reported() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let cases = [
        (json!({"current_password": PASSWORD}), "Current and new password are required"),
        (json!({"current_password": "", "new_password": "long-enough-pw"}), "Current and new password are required"),
        (
            json!({"current_password": PASSWORD, "new_password": "short"}),
            "New password must be at least 8 characters",
        ),
        (
            json!({"current_password": PASSWORD, "new_password": PASSWORD}),
            "New password must be different from the current password",
        ),
        (
            json!({"current_password": PASSWORD, "new_password": "long-enough-pw", "confirm_password": "long-enough-px"}),
            "New passwords do not match",
        ),
    ];

    for (mut fields, expected) in cases {
        fields["csrf_token"] = json!(login.csrf_token);
        let (status, body) = app.post_json(PATH, &login, fields).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", expected);
        assert_eq!(body["error"], json!(expected));
    }
    Ok(())
}
