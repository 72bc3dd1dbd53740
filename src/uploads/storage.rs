//! Storage backend for uploaded files and the write-then-record saga.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::UploadError;

/// Per-purpose directories under the upload root
pub const UPLOAD_DIRS: &[&str] = &["avatars", "kyc"];

/// Where uploaded files live. References are relative, e.g. `avatars/<name>`.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Durably write a file; a failed write leaves nothing behind
    async fn put(&self, reference: &str, data: &[u8]) -> Result<(), UploadError>;

    /// Remove a file. Removing a file that is already gone succeeds.
    async fn delete(&self, reference: &str) -> Result<(), UploadError>;

    async fn exists(&self, reference: &str) -> bool;

    /// Public URL the stored file is served under
    fn public_url(&self, reference: &str) -> String;
}

/// Files on the local filesystem below `root`
pub struct LocalUploadBackend {
    root: PathBuf,
    url_prefix: String,
}

impl LocalUploadBackend {
    pub fn new(root: impl AsRef<Path>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the per-purpose directories
    pub async fn initialize(&self) -> std::io::Result<()> {
        for dir in UPLOAD_DIRS {
            fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    /// References must be `<known dir>/<plain file name>`; anything else could escape the root
    fn resolve(&self, reference: &str) -> Result<PathBuf, UploadError> {
        let (dir, name) = reference
            .split_once('/')
            .ok_or_else(|| UploadError::InvalidReference(reference.to_string()))?;

        let name_ok = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if !UPLOAD_DIRS.contains(&dir) || !name_ok {
            return Err(UploadError::InvalidReference(reference.to_string()));
        }

        let path = self.root.join(dir).join(name);
        let escapes = path
            .strip_prefix(&self.root)
            .map(|rel| rel.components().any(|c| !matches!(c, Component::Normal(_))))
            .unwrap_or(true);
        if escapes {
            return Err(UploadError::InvalidReference(reference.to_string()));
        }

        Ok(path)
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[async_trait]
impl UploadBackend for LocalUploadBackend {
    async fn put(&self, reference: &str, data: &[u8]) -> Result<(), UploadError> {
        let path = self.resolve(reference)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = write_synced(&path, data).await {
            // Partial writes must not survive
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, reference: &str) -> Result<(), UploadError> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, reference: &str) -> bool {
        match self.resolve(reference) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn public_url(&self, reference: &str) -> String {
        format!("{}/{}", self.url_prefix, reference)
    }
}

/// Tracks files written for one request so they can be removed when a
/// later step fails. The database never references a file that was not
/// written; a file whose record failed is removed on a best-effort basis.
pub struct FileSaga {
    backend: Arc<dyn UploadBackend>,
    written: Vec<String>,
}

impl FileSaga {
    pub fn new(backend: Arc<dyn UploadBackend>) -> Self {
        Self {
            backend,
            written: Vec::new(),
        }
    }

    /// Write one file; on failure every file already written is removed
    pub async fn write(&mut self, reference: String, data: &[u8]) -> Result<(), UploadError> {
        if let Err(e) = self.backend.put(&reference, data).await {
            self.rollback().await;
            return Err(e);
        }
        self.written.push(reference);
        Ok(())
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    /// Remove everything written so far
    pub async fn rollback(&mut self) {
        for reference in self.written.drain(..) {
            if let Err(e) = self.backend.delete(&reference).await {
                tracing::warn!(reference = %reference, "Failed to remove orphaned upload: {}", e);
            }
        }
    }

    /// Run the step that records the files; its failure rolls the files back
    pub async fn finish<T, E, F>(mut self, record: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        match record.await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.rollback().await;
                Err(e)
            }
        }
    }
}
