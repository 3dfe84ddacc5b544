//! Multipart upload handling with a scoped temp-file lifecycle.
//!
//! Every file field is spooled to disk while the form is parsed. The
//! [`TempUpload`] guard deletes its file when dropped, so every exit path
//! (success, validation failure, upstream failure) cleans up. Deletion
//! failures are logged, never surfaced to the caller.

use axum::extract::multipart::{Multipart, MultipartError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Field names checked in priority order for the uploaded image. When none
/// matches, the first file under any field name is used.
const FILE_FIELDS: &[&str] = &["file", "image", "photo"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No image file uploaded")]
    NoFile,
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Failed to spool upload to disk: {0}")]
    Io(#[from] std::io::Error),
}

/// A file field spooled to disk, deleted on drop.
pub struct TempUpload {
    path: PathBuf,
    file_name: String,
}

impl TempUpload {
    async fn spool(dir: &Path, original_name: &str, data: &[u8]) -> std::io::Result<Self> {
        let path = dir.join(format!("upload-{}", Uuid::new_v4()));
        tokio::fs::write(&path, data).await?;
        Ok(Self {
            path,
            file_name: original_name.to_string(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Read the spooled bytes back.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if self.path.exists() {
                warn!("Failed to delete temp upload {:?}: {}", self.path, e);
            }
        }
    }
}

/// Parsed extraction form: the selected image plus the optional language hint.
pub struct UploadForm {
    pub file: TempUpload,
    pub language: Option<String>,
}

/// Parse the multipart form, spooling every file field under `dir`.
///
/// Unselected spools are deleted when their guards drop at the end of this
/// function.
pub async fn parse_form(mut multipart: Multipart, dir: &Path) -> Result<UploadForm, UploadError> {
    let mut files: Vec<(String, TempUpload)> = Vec::new();
    let mut language = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            let file_name = file_name.to_string();
            let data = field.bytes().await?;
            if data.is_empty() {
                continue;
            }
            let spooled = TempUpload::spool(dir, &file_name, &data).await?;
            debug!(
                "Spooled {} bytes for field {:?} to {:?}",
                data.len(),
                name,
                spooled.path
            );
            files.push((name, spooled));
        } else if name == "language" {
            language = Some(field.text().await?);
        }
    }

    if files.is_empty() {
        return Err(UploadError::NoFile);
    }

    let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    let (_, file) = files.swap_remove(preferred_index(&names));

    Ok(UploadForm { file, language })
}

/// Index of the file to use: first match in [`FILE_FIELDS`] order, else the
/// first file seen.
fn preferred_index(field_names: &[&str]) -> usize {
    FILE_FIELDS
        .iter()
        .find_map(|wanted| field_names.iter().position(|name| name == wanted))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_field_order() {
        assert_eq!(preferred_index(&["photo", "file"]), 1);
        assert_eq!(preferred_index(&["image", "photo"]), 0);
        assert_eq!(preferred_index(&["attachment"]), 0);
        assert_eq!(preferred_index(&["scan", "photo", "upload"]), 1);
    }

    #[tokio::test]
    async fn test_temp_upload_deleted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::spool(dir.path(), "note.jpg", b"bytes")
            .await
            .unwrap();
        let path = upload.path.clone();

        assert!(path.exists());
        assert_eq!(upload.read().await.unwrap(), b"bytes");
        assert_eq!(upload.file_name(), "note.jpg");

        drop(upload);
        assert!(!path.exists());
    }
}
