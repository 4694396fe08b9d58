use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::documents::{
    check_profile_image, upload_path, FileUpload, ImageRejection, ResumePolicy, ResumeRejection,
};
use super::domain::{CandidateContext, CandidateProfile, ProfileUpdate};
use super::forms::{AcademicDraft, PersonalDetailsForm};
use super::store::{DocumentStore, ProfileStore, StoreError, StoredDocument};
use crate::applications::domain::ApplicationHistoryEntry;
use crate::applications::repository::ApplicationRepository;
use crate::applications::service::{application_history, HistoryError};
use crate::config::ApplicationPolicyConfig;
use crate::jobs::catalog::{CatalogError, JobCatalog};
use crate::jobs::domain::JobListing;

pub const MIN_FULL_NAME_CHARS: usize = 2;
pub const DASHBOARD_RECENT_APPLICATIONS: usize = 5;
pub const DASHBOARD_RECOMMENDED_JOBS: usize = 3;

/// Landing page of the account area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub profile_completion: u8,
    pub recent_applications: Vec<ApplicationHistoryEntry>,
    pub recommended_jobs: Vec<JobListing>,
}

/// Account-area operations on the signed-in candidate's own profile.
pub struct AccountService {
    profiles: Arc<dyn ProfileStore>,
    documents: Arc<dyn DocumentStore>,
    catalog: Arc<dyn JobCatalog>,
    applications: Arc<dyn ApplicationRepository>,
    policy: ApplicationPolicyConfig,
}

impl AccountService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        documents: Arc<dyn DocumentStore>,
        catalog: Arc<dyn JobCatalog>,
        applications: Arc<dyn ApplicationRepository>,
        policy: ApplicationPolicyConfig,
    ) -> Self {
        Self {
            profiles,
            documents,
            catalog,
            applications,
            policy,
        }
    }

    pub fn policy(&self) -> &ApplicationPolicyConfig {
        &self.policy
    }

    pub async fn profile(&self, candidate: &CandidateContext) -> Result<Option<CandidateProfile>, AccountError> {
        Ok(self.profiles.fetch_profile(&candidate.candidate_id).await?)
    }

    pub async fn update_personal_details(
        &self,
        candidate: &CandidateContext,
        form: PersonalDetailsForm,
    ) -> Result<(), AccountError> {
        let full_name = form.full_name.trim();
        if full_name.chars().count() < MIN_FULL_NAME_CHARS {
            return Err(DetailsError::NameTooShort {
                min: MIN_FULL_NAME_CHARS,
            }
            .into());
        }

        let update = ProfileUpdate::PersonalDetails {
            full_name: full_name.to_string(),
            personal: form.personal.to_fields(),
        };
        self.profiles.update_profile(&candidate.candidate_id, update).await?;
        info!(candidate = %candidate.candidate_id, "personal details updated");
        Ok(())
    }

    pub async fn update_academic_details(
        &self,
        candidate: &CandidateContext,
        form: AcademicDraft,
    ) -> Result<(), AccountError> {
        let update = ProfileUpdate::AcademicDetails(form.to_fields());
        self.profiles.update_profile(&candidate.candidate_id, update).await?;
        info!(candidate = %candidate.candidate_id, "academic details updated");
        Ok(())
    }

    /// Upload a new primary resume under the same rules as the application wizard.
    pub async fn replace_resume(
        &self,
        candidate: &CandidateContext,
        file: FileUpload,
    ) -> Result<StoredDocument, AccountError> {
        ResumePolicy::from(&self.policy).check(&file)?;

        let path = upload_path(&candidate.candidate_id, &file.file_name, Utc::now());
        let stored = self
            .documents
            .upload(&self.policy.resume_bucket, &path, &file)
            .await
            .map_err(|err| {
                warn!(candidate = %candidate.candidate_id, error = %err, "resume upload failed");
                AccountError::Store(err)
            })?;

        self.profiles
            .update_profile(
                &candidate.candidate_id,
                ProfileUpdate::PrimaryResume(Some(stored.public_url.clone())),
            )
            .await?;
        info!(candidate = %candidate.candidate_id, path = %stored.path, "primary resume replaced");
        Ok(stored)
    }

    /// Forget the primary resume. The stored object itself is left in place.
    pub async fn remove_resume(&self, candidate: &CandidateContext) -> Result<(), AccountError> {
        self.profiles
            .update_profile(&candidate.candidate_id, ProfileUpdate::PrimaryResume(None))
            .await?;
        info!(candidate = %candidate.candidate_id, "primary resume removed");
        Ok(())
    }

    pub async fn upload_profile_image(
        &self,
        candidate: &CandidateContext,
        file: FileUpload,
    ) -> Result<StoredDocument, AccountError> {
        check_profile_image(&file)?;

        let path = upload_path(&candidate.candidate_id, &file.file_name, Utc::now());
        let stored = self
            .documents
            .upload(&self.policy.profile_image_bucket, &path, &file)
            .await?;
        self.profiles
            .update_profile(
                &candidate.candidate_id,
                ProfileUpdate::ProfileImage(stored.public_url.clone()),
            )
            .await?;
        info!(candidate = %candidate.candidate_id, "profile image updated");
        Ok(stored)
    }

    pub async fn application_history(
        &self,
        candidate: &CandidateContext,
    ) -> Result<Vec<ApplicationHistoryEntry>, AccountError> {
        Ok(application_history(
            self.applications.as_ref(),
            self.catalog.as_ref(),
            &candidate.candidate_id,
        )
        .await?)
    }

    /// Profile completeness, the latest applications and the newest open roles.
    ///
    /// When nothing is open, the newest roles are suggested whatever their status.
    pub async fn dashboard(&self, candidate: &CandidateContext) -> Result<Dashboard, AccountError> {
        let profile_completion = self
            .profiles
            .fetch_profile(&candidate.candidate_id)
            .await?
            .map(|profile| profile.completion_percent())
            .unwrap_or(0);

        let mut recent_applications = self.application_history(candidate).await?;
        recent_applications.truncate(DASHBOARD_RECENT_APPLICATIONS);

        let mut recommended_jobs = self.catalog.active_jobs().await?;
        if recommended_jobs.is_empty() {
            warn!("no active jobs; recommending the newest listings instead");
            recommended_jobs = self.catalog.recent_jobs(DASHBOARD_RECOMMENDED_JOBS).await?;
        }
        recommended_jobs.truncate(DASHBOARD_RECOMMENDED_JOBS);

        Ok(Dashboard {
            profile_completion,
            recent_applications,
            recommended_jobs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailsError {
    #[error("Name must be at least {min} characters")]
    NameTooShort { min: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Details(#[from] DetailsError),
    #[error(transparent)]
    Resume(#[from] ResumeRejection),
    #[error(transparent)]
    Image(#[from] ImageRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
