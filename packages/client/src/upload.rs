//! File attachments: read, size-check, stage as base64, upload.
//!
//! Every path a screen uploads to is built here.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use common::api::StoredObject;
use common::codec;
use common::storage::{Bucket, sanitize_file_name};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{Alert, ClientError};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("The selected file is empty")]
    Empty,
    #[error("Please select a file smaller than {}MB", .limit / MIB)]
    TooLarge { size: u64, limit: u64 },
    #[error("File does not exist or is not accessible")]
    Io(#[from] io::Error),
}

impl AttachmentError {
    pub fn alert(&self) -> Alert {
        match self {
            Self::Empty => Alert::new("Invalid file", self.to_string()),
            Self::TooLarge { .. } => Alert::new("File too large", self.to_string()),
            Self::Io(_) => Alert::error(self.to_string()),
        }
    }
}

impl From<AttachmentError> for ClientError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::Io(e) => ClientError::Io(e),
            other => ClientError::Validation(other.to_string()),
        }
    }
}

/// A picked file, read fully and staged as base64.
#[derive(Clone, Debug)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    encoded: String,
}

impl Attachment {
    pub fn from_bytes(
        file_name: &str,
        bytes: &[u8],
        max_size: u64,
    ) -> Result<Self, AttachmentError> {
        let size = bytes.len() as u64;
        if size == 0 {
            return Err(AttachmentError::Empty);
        }
        if size > max_size {
            return Err(AttachmentError::TooLarge {
                size,
                limit: max_size,
            });
        }
        Ok(Self {
            file_name: file_name.to_string(),
            content_type: mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .to_string(),
            size,
            encoded: codec::encode(bytes),
        })
    }

    /// Read a file from disk. The size is checked before the content is loaded.
    pub async fn read(path: impl AsRef<Path>, max_size: u64) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        if size == 0 {
            return Err(AttachmentError::Empty);
        }
        if size > max_size {
            return Err(AttachmentError::TooLarge {
                size,
                limit: max_size,
            });
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".into());
        Self::from_bytes(&file_name, &bytes, max_size)
    }

    /// Lowercase extension of the picked name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// Decode the staged payload into the blob that gets uploaded.
    pub fn to_blob(&self) -> Result<Vec<u8>, ClientError> {
        Ok(codec::decode(&self.encoded)?)
    }
}

/// `submissions/{student_id}/{unix_millis}-{file_name}`
pub fn submission_file_path(student_id: Uuid, file_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "submissions/{student_id}/{}-{}",
        at.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// `tasks/{teacher_id}/{unix_millis}.{ext}`
pub fn task_file_path(teacher_id: Uuid, extension: Option<&str>, at: DateTime<Utc>) -> String {
    with_extension(format!("tasks/{teacher_id}/{}", at.timestamp_millis()), extension)
}

/// `{user_id}/{unix_millis}.{ext}`
pub fn profile_image_path(user_id: Uuid, extension: Option<&str>, at: DateTime<Utc>) -> String {
    with_extension(format!("{user_id}/{}", at.timestamp_millis()), extension)
}

fn with_extension(stem: String, extension: Option<&str>) -> String {
    let ext = extension.map(sanitize_file_name).filter(|e| e != "file");
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// Upload an attachment to `bucket/path`, replacing any previous object there.
pub async fn upload(
    backend: &dyn Backend,
    token: &str,
    bucket: Bucket,
    path: &str,
    attachment: &Attachment,
) -> Result<StoredObject, ClientError> {
    let blob = attachment.to_blob()?;
    let stored = backend
        .upload(token, bucket, path, &attachment.content_type, blob)
        .await?;
    tracing::debug!(bucket = %stored.bucket, path = %stored.path, size = stored.size, "Uploaded attachment");
    Ok(stored)
}
