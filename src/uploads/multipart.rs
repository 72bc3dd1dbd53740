use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap};

use crate::api::RequestFields;

/// One file part of a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Text fields and file parts of a form submission
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub fields: RequestFields,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Remove and return a file part. Parts sent without content count as absent.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| {
            !f.bytes.is_empty() || f.file_name.as_deref().is_some_and(|n| !n.is_empty())
        })
    }
}

/// Parse a request body that may be multipart; other content types fall back
/// to plain field parsing. A malformed multipart body yields no fields.
pub async fn parse_form(headers: &HeaderMap, body: Bytes) -> FormData {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if !content_type.starts_with("multipart/form-data") {
        return FormData {
            fields: RequestFields::from_body(headers, &body),
            files: HashMap::new(),
        };
    }

    let boundary = match multer::parse_boundary(content_type) {
        Ok(boundary) => boundary,
        Err(e) => {
            tracing::debug!("Multipart body without usable boundary: {}", e);
            return FormData::default();
        }
    };

    match read_parts(body, boundary).await {
        Ok(form) => form,
        Err(e) => {
            tracing::debug!("Ignoring malformed multipart body: {}", e);
            FormData::default()
        }
    }
}

async fn read_parts(body: Bytes, boundary: String) -> Result<FormData, multer::Error> {
    // Convert Bytes to a stream for multer
    let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await? {
        let name = match field.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await?;
                let file_name = Some(file_name).filter(|n| !n.is_empty());
                form.files.insert(name, UploadedFile { file_name, bytes });
            }
            None => {
                let text = field.text().await?;
                form.fields.insert_text(name, text);
            }
        }
    }

    Ok(form)
}
