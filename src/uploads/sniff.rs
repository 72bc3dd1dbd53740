//! Content sniffing for uploaded files.
//!
//! The declared content type and the file name are never trusted; the type
//! comes from the leading magic bytes.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Pdf,
}

impl DetectedType {
    pub fn mime(&self) -> &'static str {
        match self {
            DetectedType::Jpeg => "image/jpeg",
            DetectedType::Png => "image/png",
            DetectedType::Gif => "image/gif",
            DetectedType::Webp => "image/webp",
            DetectedType::Pdf => "application/pdf",
        }
    }

    /// Canonical extension used when the original name offers nothing better
    pub fn extension(&self) -> &'static str {
        match self {
            DetectedType::Jpeg => "jpg",
            DetectedType::Png => "png",
            DetectedType::Gif => "gif",
            DetectedType::Webp => "webp",
            DetectedType::Pdf => "pdf",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            DetectedType::Jpeg => &["jpg", "jpeg"],
            DetectedType::Png => &["png"],
            DetectedType::Gif => &["gif"],
            DetectedType::Webp => &["webp"],
            DetectedType::Pdf => &["pdf"],
        }
    }

    /// Extension for the stored file: the original one if it names this type
    pub fn extension_for(&self, original_name: Option<&str>) -> String {
        original_name
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| self.aliases().contains(&ext.as_str()))
            .unwrap_or_else(|| self.extension().to_string())
    }
}

/// Detect the file type from magic bytes
pub fn detect(data: &[u8]) -> Option<DetectedType> {
    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(DetectedType::Jpeg);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(DetectedType::Png);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(DetectedType::Gif);
    }

    // RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(DetectedType::Webp);
    }

    if data.starts_with(b"%PDF-") {
        return Some(DetectedType::Pdf);
    }

    None
}

/// Hex SHA-256 of the file contents
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
