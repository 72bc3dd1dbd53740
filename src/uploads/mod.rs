pub mod multipart;
pub mod sniff;
pub mod storage;

use chrono::Utc;
use thiserror::Error;

use crate::types::DocumentType;

pub use multipart::{parse_form, FormData, UploadedFile};
pub use sniff::{detect, sha256_hex, DetectedType};
pub use storage::{FileSaga, LocalUploadBackend, UploadBackend};

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Missing(String),

    #[error("Uploaded file is empty")]
    Empty,

    #[error("File too large. Maximum size is {}MB", .max_bytes / MIB)]
    TooLarge { max_bytes: usize },

    #[error("{0}")]
    UnsupportedType(String),

    #[error("Invalid upload reference: {0}")]
    InvalidReference(String),

    #[error("Upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Failures of the storage side rather than of the submitted file
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, UploadError::Io(_) | UploadError::InvalidReference(_))
    }
}

/// Accepted content types and size cap for one upload purpose
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub allowed: &'static [DetectedType],
    pub max_bytes: usize,
    type_error: &'static str,
}

impl UploadPolicy {
    pub fn avatar(max_bytes: usize) -> Self {
        Self {
            allowed: &[
                DetectedType::Jpeg,
                DetectedType::Png,
                DetectedType::Gif,
                DetectedType::Webp,
            ],
            max_bytes,
            type_error: "Invalid file type. Only JPG, PNG, GIF and WEBP images are allowed",
        }
    }

    pub fn kyc(max_bytes: usize) -> Self {
        Self {
            allowed: &[
                DetectedType::Jpeg,
                DetectedType::Png,
                DetectedType::Webp,
                DetectedType::Pdf,
            ],
            max_bytes,
            type_error: "Invalid file type. Only JPG, PNG, WEBP and PDF files are allowed",
        }
    }

    /// Check size and sniffed type; nothing is written here
    pub fn validate(&self, file: &UploadedFile) -> Result<DetectedType, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        match detect(&file.bytes) {
            Some(kind) if self.allowed.contains(&kind) => Ok(kind),
            _ => Err(UploadError::UnsupportedType(self.type_error.to_string())),
        }
    }
}

/// Which face of an identity document a file shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSide::Front => "front",
            DocumentSide::Back => "back",
        }
    }
}

fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// `avatars/avatar_{user}_{ts}_{random}.{ext}`
pub fn avatar_reference(user_id: i64, extension: &str) -> String {
    format!(
        "avatars/avatar_{}_{}_{}.{}",
        user_id,
        Utc::now().timestamp(),
        random_suffix(),
        extension
    )
}

/// `kyc/kyc_{user}_{type}_{side}_{ts}_{random}.{ext}`
pub fn kyc_reference(user_id: i64, document_type: DocumentType, side: DocumentSide, extension: &str) -> String {
    format!(
        "kyc/kyc_{}_{}_{}_{}_{}.{}",
        user_id,
        document_type.as_str(),
        side.as_str(),
        Utc::now().timestamp(),
        random_suffix(),
        extension
    )
}
