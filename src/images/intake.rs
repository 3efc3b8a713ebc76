//! Intake of a single profile image: type and size checks, unique naming and the
//! write to storage.

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{error::AccountError, storage::StorageClient};

/// Multipart field carrying the image.
pub const PROFILE_FIELD: &str = "profile";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Please select a valid image file to upload.")]
    Missing,
    #[error("Only image files (JPEG, JPG, PNG, GIF) are allowed!")]
    WrongType,
    #[error("File too large. Maximum size is {}.", size_label(.max_bytes))]
    TooLarge { max_bytes: usize },
    #[error("Only one profile image may be uploaded at a time.")]
    UnexpectedField,
    #[error("The upload could not be read. Please try again.")]
    Malformed,
}

/// Upload limit as shown to users, rounded up to the largest whole unit.
fn size_label(bytes: &usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    match *bytes {
        b if b >= MB => format!("{}MB", b.div_ceil(MB)),
        b if b >= KB => format!("{}KB", b.div_ceil(KB)),
        b => format!("{} bytes", b),
    }
}

/// A file as received from the client, not yet stored.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// A file that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Clone)]
pub struct UploadIntake {
    storage: Arc<dyn StorageClient>,
    max_bytes: usize,
}

impl UploadIntake {
    pub fn new(storage: Arc<dyn StorageClient>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Type check on declared name and media type. Both must pass.
    /// Returns the lower-cased extension to keep on the stored name.
    pub fn check_type(&self, file_name: &str, content_type: &str) -> Result<String, UploadRejection> {
        let ext = extension_of(file_name).ok_or(UploadRejection::WrongType)?;
        let mime = content_type.trim().to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(UploadRejection::WrongType);
        }
        Ok(ext)
    }

    pub fn check_size(&self, len: usize) -> Result<(), UploadRejection> {
        if len > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validates the file and writes it under a freshly generated name.
    /// Nothing is written when validation fails.
    pub async fn accept(&self, file: IncomingFile) -> Result<StoredFile, AccountError> {
        if file.file_name.is_empty() {
            return Err(UploadRejection::Missing.into());
        }
        let ext = self.check_type(&file.file_name, &file.content_type).map_err(|r| {
            warn!(file_name = %file.file_name, content_type = %file.content_type, "upload type rejected");
            r
        })?;
        self.check_size(file.body.len())?;

        let name = unique_file_name(&ext);
        let size = file.body.len();
        self.storage
            .put_object(&name, file.body)
            .await
            .map_err(AccountError::Storage)?;
        debug!(file = %name, size, "upload stored");

        Ok(StoredFile {
            name,
            content_type: file.content_type.trim().to_ascii_lowercase(),
            size,
        })
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// `profile-<unix millis>-<random>.<ext>`
pub fn unique_file_name(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("profile-{}-{}.{}", millis, suffix, ext)
}

/// Content type to serve a stored file with, from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
