use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::CandidateId;
use crate::config::ApplicationPolicyConfig;

/// File picked by the candidate. Held in memory only; never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn essence(&self) -> Option<mime::Mime> {
        self.content_type.trim().parse::<mime::Mime>().ok()
    }

    /// Metadata view used in API responses.
    pub fn describe(&self) -> AttachedFile {
        AttachedFile {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size(),
        }
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedFile {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Reasons a resume is refused before any upload is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeRejection {
    #[error("Invalid file type: please upload a PDF file (received {found})")]
    InvalidType { found: String },
    #[error("File too large: please upload a file smaller than {max_bytes} bytes (received {size_bytes})")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

/// Acceptance rules for resumes: PDF only, bounded size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePolicy {
    max_bytes: u64,
}

impl ResumePolicy {
    pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

    /// `max_bytes` is taken as given; configuration already refuses a zero limit.
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn check(&self, file: &FileUpload) -> Result<(), ResumeRejection> {
        let is_pdf = file
            .essence()
            .map(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
            .unwrap_or(false);
        if !is_pdf {
            return Err(ResumeRejection::InvalidType {
                found: file.content_type.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(ResumeRejection::TooLarge {
                size_bytes: file.size(),
                max_bytes: self.max_bytes,
            });
        }

        Ok(())
    }
}

impl Default for ResumePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_BYTES)
    }
}

impl From<&ApplicationPolicyConfig> for ResumePolicy {
    fn from(config: &ApplicationPolicyConfig) -> Self {
        Self::new(config.resume_max_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid file type: please upload an image file (received {found})")]
pub struct ImageRejection {
    pub found: String,
}

pub fn check_profile_image(file: &FileUpload) -> Result<(), ImageRejection> {
    match file.essence() {
        Some(parsed) if parsed.type_() == mime::IMAGE => Ok(()),
        _ => Err(ImageRejection {
            found: file.content_type.clone(),
        }),
    }
}

/// Object path for an upload: `<candidate>/<millis>-<file name>`.
///
/// The timestamp keeps repeated uploads of the same file name from replacing each other.
pub fn upload_path(candidate: &CandidateId, file_name: &str, at: DateTime<Utc>) -> String {
    let file_name = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("upload");
    format!("{}/{}-{}", candidate.0, at.timestamp_millis(), file_name)
}
