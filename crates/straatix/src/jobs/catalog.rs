use async_trait::async_trait;

use super::domain::{JobId, JobListing};

/// System of record for open positions.
#[async_trait]
pub trait JobCatalog: Send + Sync {
    /// Active job by id. Missing and inactive jobs both yield `None`.
    async fn fetch_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError>;

    /// All active jobs, newest first.
    async fn active_jobs(&self) -> Result<Vec<JobListing>, CatalogError>;

    /// Job by id whatever its status, so past applications keep their job details.
    async fn find_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError>;

    /// Newest jobs whatever their status, at most `limit`.
    async fn recent_jobs(&self, limit: usize) -> Result<Vec<JobListing>, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("job catalog unavailable: {0}")]
    Unavailable(String),
}
