#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use landtrade_profile_api::app;
use landtrade_profile_api::auth::{PasswordPolicy, SessionTokens};
use landtrade_profile_api::database::models::User;
use landtrade_profile_api::state::{AppState, HttpSettings};
use landtrade_profile_api::testing::{
    sample_session, sample_user, FlakyBackend, MemoryCredentialService, MemoryStore,
};
use landtrade_profile_api::uploads::{LocalUploadBackend, UploadBackend, UploadPolicy};

pub const SECRET: &str = "test-session-secret";
pub const COOKIE: &str = "landtrade_session";
pub const PASSWORD: &str = "original-password";
pub const MIB: usize = 1024 * 1024;

pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R'];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F', 0];
pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n";

/// Credentials of a logged-in test session
#[derive(Debug, Clone)]
pub struct Login {
    pub user_id: i64,
    pub session_id: String,
    pub csrf_token: String,
    pub token: String,
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub uploads: Arc<dyn UploadBackend>,
    pub router: Router,
    tokens: SessionTokens,
    upload_dir: TempDir,
}

pub struct TestAppBuilder {
    failing_writes: Option<String>,
}

impl TestAppBuilder {
    /// Make every upload write whose reference contains `pattern` fail
    pub fn failing_writes(mut self, pattern: &str) -> Self {
        self.failing_writes = Some(pattern.to_string());
        self
    }

    pub fn build(self) -> TestApp {
        let store = MemoryStore::new();
        let upload_dir = TempDir::new().expect("temp upload dir");
        let local: Arc<dyn UploadBackend> = Arc::new(LocalUploadBackend::new(upload_dir.path(), "/uploads"));
        let uploads: Arc<dyn UploadBackend> = match self.failing_writes {
            Some(pattern) => Arc::new(FlakyBackend::new(local, pattern)),
            None => local,
        };
        let tokens = SessionTokens::new(SECRET, COOKIE);

        let state = AppState {
            users: store.clone(),
            sessions: store.clone(),
            preferences: store.clone(),
            kyc: store.clone(),
            audit: store.clone(),
            notifier: store.clone(),
            credentials: Arc::new(MemoryCredentialService::new(store.clone(), PasswordPolicy::new(4))),
            uploads: uploads.clone(),
            tokens: tokens.clone(),
            avatar_policy: UploadPolicy::avatar(5 * MIB),
            kyc_policy: UploadPolicy::kyc(5 * MIB),
            http: HttpSettings {
                max_body_bytes: 12 * MIB,
                enable_cors: false,
                cors_origins: Vec::new(),
                request_logging: false,
            },
        };

        TestApp {
            store,
            uploads,
            router: app(state),
            tokens,
            upload_dir,
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestAppBuilder {
        TestAppBuilder { failing_writes: None }
    }

    /// Insert an active user whose password is `PASSWORD`
    pub fn seed_user(&self, id: i64, full_name: &str, email: &str) -> User {
        let mut user = sample_user(id, full_name, email);
        user.password_hash = PasswordPolicy::new(4).hash(PASSWORD).expect("hash test password");
        self.store.insert_user(user.clone());
        user
    }

    /// Create a session row for `user_id` and sign a token for it
    pub fn login(&self, user_id: i64) -> Login {
        let session_id = format!("sess-{}", uuid::Uuid::new_v4().simple());
        let csrf_token = format!("csrf-{}", uuid::Uuid::new_v4().simple());
        self.store.insert_session(sample_session(&session_id, user_id, &csrf_token));
        let token = self
            .tokens
            .issue(user_id, &session_id, Duration::hours(1))
            .expect("issue test token");
        Login {
            user_id,
            session_id,
            csrf_token,
            token,
        }
    }

    pub fn upload_root(&self) -> &Path {
        self.upload_dir.path()
    }

    /// File names currently stored under `<root>/<dir>`
    pub fn stored_files(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_root().join(dir))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, login: &Login) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
            .body(Body::empty())?;
        self.send(request).await
    }

    /// POST a JSON body as-is; callers include `csrf_token` when they want one
    pub async fn post_json(&self, path: &str, login: &Login, body: Value) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    pub async fn post_multipart(&self, path: &str, login: &Login, parts: &[Part<'_>]) -> Result<(StatusCode, Value)> {
        let (content_type, body) = multipart_body(parts);
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))?;
        self.send(request).await
    }
}

/// One part of a multipart form
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn file<'a>(name: &'a str, file_name: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name,
        file_name,
        content_type: "application/octet-stream",
        bytes,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let boundary = "----landtrade-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// A JPEG header padded out to `len` bytes
pub fn jpeg_of_size(len: usize) -> Vec<u8> {
    let mut data = JPEG.to_vec();
    data.resize(len, 0);
    data
}
