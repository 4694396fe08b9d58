use async_trait::async_trait;

use super::domain::{ApplicationRecord, SubmissionSnapshot};
use crate::candidates::domain::CandidateId;
use crate::jobs::domain::JobId;

/// Insert-only store of submitted applications.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Stores a new record. A second record for the same candidate and job is a `Conflict`.
    async fn insert(&self, snapshot: SubmissionSnapshot) -> Result<ApplicationRecord, RepositoryError>;

    async fn has_existing_application(
        &self,
        candidate: &CandidateId,
        job: &JobId,
    ) -> Result<bool, RepositoryError>;

    /// Records for one candidate, newest first.
    async fn for_candidate(&self, candidate: &CandidateId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("an application for this job already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
