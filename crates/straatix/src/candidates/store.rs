use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::documents::FileUpload;
use super::domain::{CandidateId, CandidateProfile, ProfileUpdate};

/// System of record for reusable candidate profile data.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<CandidateProfile>, StoreError>;

    async fn update_profile(
        &self,
        candidate: &CandidateId,
        update: ProfileUpdate,
    ) -> Result<(), StoreError>;
}

/// Binary object store returning durable URLs for uploaded files.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &FileUpload,
    ) -> Result<StoredDocument, StoreError>;
}

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

/// Failure reported by a remote store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("request rejected by storage: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
