mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{file, jpeg_of_size, Part, TestApp, JPEG, MIB, PNG};

const PATH: &str = "/api/profile/avatar";

#[tokio::test]
async fn stores_the_image_and_points_the_profile_at_it() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[Part::Text("csrf_token", &login.csrf_token), file("avatar", "me.PNG", PNG)],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Avatar updated successfully"));

    let reference = app.store.user(1).unwrap().profile_image.unwrap();
    assert!(reference.starts_with("avatars/avatar_1_"));
    assert!(reference.ends_with(".png"));
    assert_eq!(body["avatar_url"], json!(format!("/uploads/{}", reference)));

    let stored = std::fs::read(app.upload_root().join(&reference))?;
    assert_eq!(stored, PNG);

    let audit = app.store.audit_entries();
    assert_eq!(audit[0].action.as_str(), "avatar_update");
    assert_eq!(audit[0].metadata.as_ref().unwrap()["content_type"], json!("image/png"));

    let (_, body) = app.get("/api/profile", &login).await?;
    assert_eq!(body["profile"]["avatar_url"], json!(format!("/uploads/{}", reference)));
    Ok(())
}

#[tokio::test]
async fn replacing_the_avatar_removes_the_previous_file() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let parts = [Part::Text("csrf_token", &login.csrf_token), file("avatar", "first.png", PNG)];
    let (status, _) = app.post_multipart(PATH, &login, &parts).await?;
    assert_eq!(status, StatusCode::OK);
    let first = app.store.user(1).unwrap().profile_image.unwrap();

    let parts = [Part::Text("csrf_token", &login.csrf_token), file("avatar", "second.jpg", JPEG)];
    let (status, _) = app.post_multipart(PATH, &login, &parts).await?;
    assert_eq!(status, StatusCode::OK);
    let second = app.store.user(1).unwrap().profile_image.unwrap();

    assert_ne!(first, second);
    assert!(second.ends_with(".jpg"));
    assert!(!app.upload_root().join(&first).exists());
    assert!(app.upload_root().join(&second).exists());
    assert_eq!(app.stored_files("avatars").len(), 1);
    Ok(())
}

#[tokio::test]
async fn text_file_renamed_png_is_rejected() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::File {
                    name: "avatar",
                    file_name: "totally-a-photo.png",
                    content_type: "image/png",
                    bytes: b"<?php echo 'hello'; ?>",
                },
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Invalid file type. Only JPG, PNG, GIF and WEBP images are allowed")
    );
    assert!(app.stored_files("avatars").is_empty());
    assert!(app.store.user(1).unwrap().profile_image.is_none());
    Ok(())
}

#[tokio::test]
async fn oversized_image_is_rejected_before_writing() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);
    let big = jpeg_of_size(6 * MIB);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[Part::Text("csrf_token", &login.csrf_token), file("avatar", "big.jpg", &big)],
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("File too large. Maximum size is 5MB"));
    assert!(app.stored_files("avatars").is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_file_and_missing_csrf() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_multipart(PATH, &login, &[Part::Text("csrf_token", &login.csrf_token)])
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file uploaded"));

    let (status, _) = app.post_multipart(PATH, &login, &[file("avatar", "me.png", PNG)]).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.stored_files("avatars").is_empty());
    Ok(())
}

#[tokio::test]
async fn database_failure_removes_the_new_file() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);
    app.store.fail.profile_image.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[Part::Text("csrf_token", &login.csrf_token), file("avatar", "me.png", PNG)],
        )
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to update avatar"));
    assert!(app.stored_files("avatars").is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_write_is_a_500_and_leaves_profile_untouched() -> Result<()> {
    let app = TestApp::builder().failing_writes("avatars/").build();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[Part::Text("csrf_token", &login.csrf_token), file("avatar", "me.png", PNG)],
        )
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to save uploaded file"));
    assert!(app.store.user(1).unwrap().profile_image.is_none());
    Ok(())
}

#[tokio::test]
async fn body_over_the_request_limit_gets_the_error_envelope() -> Result<()> {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);
    let huge = jpeg_of_size(13 * MIB);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[Part::Text("csrf_token", &login.csrf_token), file("avatar", "huge.jpg", &huge)],
        )
        .await?;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"success": false, "error": "Request body too large"}));
    assert!(app.stored_files("avatars").is_empty());
    assert!(app.store.user(1).unwrap().profile_image.is_none());
    Ok(())
}
