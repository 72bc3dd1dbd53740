mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{file, jpeg_of_size, Login, Part, TestApp, JPEG, MIB, PDF, PNG};
use landtrade_profile_api::types::{DocumentType, KycStatus, ReviewStatus, UserRole};

const PATH: &str = "/api/profile/kyc";
const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

fn seeded() -> (TestApp, Login) {
    let app = TestApp::new();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);
    (app, login)
}

#[tokio::test]
async fn submission_records_document_and_moves_status_to_pending() -> Result<()> {
    let (app, login) = seeded();
    let mut admin = app.seed_user(90, "Admin One", "admin@example.com");
    admin.role = UserRole::Admin;
    app.store.insert_user(admin);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "drivers_license"),
                Part::Text("document_number", " N01-23-456789 "),
                file("front_image", "front.jpg", JPEG),
                file("back_image", "back.pdf", PDF),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!("Document uploaded successfully. Verification is pending review.")
    );
    assert_eq!(body["kyc_status"], json!("pending"));

    let documents = app.store.kyc_documents();
    assert_eq!(documents.len(), 1);
    let document = &documents[0];
    assert_eq!(document.document_type, DocumentType::DriversLicense);
    assert_eq!(document.document_number.as_deref(), Some("N01-23-456789"));
    assert_eq!(document.status, ReviewStatus::Pending);
    assert!(document.front_image.starts_with("kyc/kyc_1_drivers_license_front_"));
    let back = document.back_image.as_deref().unwrap();
    assert!(back.starts_with("kyc/kyc_1_drivers_license_back_"));
    assert!(back.ends_with(".pdf"));
    assert!(app.upload_root().join(&document.front_image).exists());
    assert!(app.upload_root().join(back).exists());

    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::Pending);
    assert_eq!(
        app.store.session(&login.session_id).unwrap().cached_kyc_status,
        Some(KycStatus::Pending)
    );

    let notifications = app.store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, 90);
    assert_eq!(notifications[0].kind, "kyc_submitted");

    let audit = app.store.audit_entries();
    assert_eq!(audit[0].action.as_str(), "kyc_upload");
    let metadata = audit[0].metadata.as_ref().unwrap();
    assert_eq!(metadata["document_type"], json!("drivers_license"));
    assert_eq!(metadata["front_sha256"].as_str().unwrap().len(), 64);
    Ok(())
}

#[tokio::test]
async fn repeated_submission_keeps_status_pending() -> Result<()> {
    let (app, login) = seeded();

    for _ in 0..2 {
        let (status, body) = app
            .post_multipart(
                PATH,
                &login,
                &[
                    Part::Text("csrf_token", &login.csrf_token),
                    Part::Text("document_type", "passport"),
                    file("front_image", "front.png", PNG),
                ],
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kyc_status"], json!("pending"));
    }

    assert_eq!(app.store.kyc_documents().len(), 2);
    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::Pending);
    assert!(app.store.kyc_documents().iter().all(|d| d.back_image.is_none()));
    Ok(())
}

#[tokio::test]
async fn verified_users_stay_verified() -> Result<()> {
    let (app, login) = seeded();
    let mut user = app.store.user(1).unwrap();
    user.kyc_status = KycStatus::Verified;
    app.store.insert_user(user);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "umid"),
                file("front_image", "front.png", PNG),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kyc_status"], json!("verified"));
    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::Verified);
    Ok(())
}

#[tokio::test]
async fn input_errors_write_nothing() -> Result<()> {
    let (app, login) = seeded();
    let big = jpeg_of_size(6 * MIB);

    let cases: Vec<(Vec<Part<'_>>, &str)> = vec![
        (
            vec![Part::Text("document_type", "library_card"), file("front_image", "f.png", PNG)],
            "Invalid document type",
        ),
        (vec![file("front_image", "f.png", PNG)], "Document type is required"),
        (vec![Part::Text("document_type", "passport")], "Front image is required"),
        (
            vec![Part::Text("document_type", "passport"), file("front_image", "f.gif", GIF)],
            "Invalid file type. Only JPG, PNG, WEBP and PDF files are allowed",
        ),
        (
            vec![Part::Text("document_type", "passport"), file("front_image", "f.jpg", &big)],
            "File too large. Maximum size is 5MB",
        ),
        (
            // A bad back image stops the front from being written too
            vec![
                Part::Text("document_type", "passport"),
                file("front_image", "f.png", PNG),
                file("back_image", "b.txt", b"plain text"),
            ],
            "Invalid file type. Only JPG, PNG, WEBP and PDF files are allowed",
        ),
    ];

    for (mut parts, expected) in cases {
        parts.push(Part::Text("csrf_token", &login.csrf_token));
        let (status, body) = app.post_multipart(PATH, &login, &parts).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", expected);
        assert_eq!(body["error"], json!(expected));
    }

    assert!(app.stored_files("kyc").is_empty());
    assert!(app.store.kyc_documents().is_empty());
    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::None);
    Ok(())
}

#[tokio::test]
async fn failed_back_write_removes_the_front_file() -> Result<()> {
    let app = TestApp::builder().failing_writes("_back_").build();
    app.seed_user(1, "Ana Reyes", "ana@example.com");
    let login = app.login(1);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "national_id"),
                file("front_image", "front.png", PNG),
                file("back_image", "back.png", PNG),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(app.stored_files("kyc").is_empty());
    assert!(app.store.kyc_documents().is_empty());
    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::None);
    Ok(())
}

#[tokio::test]
async fn failed_insert_removes_both_files() -> Result<()> {
    let (app, login) = seeded();
    app.store.fail.kyc_insert.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "passport"),
                file("front_image", "front.png", PNG),
                file("back_image", "back.png", PNG),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to save document"));
    assert!(app.stored_files("kyc").is_empty());
    assert_eq!(app.store.user(1).unwrap().kyc_status, KycStatus::None);
    Ok(())
}

#[tokio::test]
async fn notification_and_audit_failures_do_not_fail_the_upload() -> Result<()> {
    let (app, login) = seeded();
    let mut admin = app.seed_user(90, "Admin One", "admin@example.com");
    admin.role = UserRole::Admin;
    app.store.insert_user(admin);
    app.store.fail.notifications.store(true, Ordering::SeqCst);
    app.store.fail.audit.store(true, Ordering::SeqCst);

    let (status, _) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "tin_id"),
                file("front_image", "front.png", PNG),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.kyc_documents().len(), 1);
    assert!(app.store.notifications().is_empty());
    Ok(())
}

#[tokio::test]
async fn status_advance_failure_still_records_the_document() -> Result<()> {
    let (app, login) = seeded();
    app.store.fail.kyc_status.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post_multipart(
            PATH,
            &login,
            &[
                Part::Text("csrf_token", &login.csrf_token),
                Part::Text("document_type", "postal_id"),
                file("front_image", "front.png", PNG),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kyc_status"], json!("none"));
    assert_eq!(app.store.kyc_documents().len(), 1);
    assert_eq!(app.stored_files("kyc").len(), 1);
    Ok(())
}
