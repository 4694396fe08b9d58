use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::domain::{ApplicationHistoryEntry, ApplicationRecord, SubmissionSnapshot};
use super::repository::{ApplicationRepository, RepositoryError};
use super::session::WizardSession;
use super::validation::ValidationRules;
use super::wizard::{ApplicationWizard, WizardError};
use crate::candidates::documents::{upload_path, ResumePolicy};
use crate::candidates::domain::{CandidateContext, CandidateId, ProfileUpdate};
use crate::candidates::store::{DocumentStore, ProfileStore, StoreError};
use crate::config::ApplicationPolicyConfig;
use crate::jobs::catalog::{CatalogError, JobCatalog};
use crate::jobs::domain::{JobId, JobListing};
use crate::jobs::search::{JobBoard, JobQuery};

/// Service composing the profile, document, job catalog and application stores.
pub struct ApplicationService {
    profiles: Arc<dyn ProfileStore>,
    documents: Arc<dyn DocumentStore>,
    catalog: Arc<dyn JobCatalog>,
    repository: Arc<dyn ApplicationRepository>,
    policy: ApplicationPolicyConfig,
}

impl ApplicationService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        documents: Arc<dyn DocumentStore>,
        catalog: Arc<dyn JobCatalog>,
        repository: Arc<dyn ApplicationRepository>,
        policy: ApplicationPolicyConfig,
    ) -> Self {
        Self {
            profiles,
            documents,
            catalog,
            repository,
            policy,
        }
    }

    pub fn policy(&self) -> &ApplicationPolicyConfig {
        &self.policy
    }

    /// Open a wizard for `job_id`.
    ///
    /// A job the candidate already applied to opens straight into the submitted state.
    /// A failing profile lookup is not fatal: the draft simply starts empty.
    pub async fn open(
        &self,
        candidate: CandidateContext,
        job_id: &JobId,
    ) -> Result<WizardSession, ApplicationServiceError> {
        let job = self
            .catalog
            .fetch_job(job_id)
            .await?
            .ok_or_else(|| ApplicationServiceError::JobNotFound(job_id.clone()))?;

        if self
            .repository
            .has_existing_application(&candidate.candidate_id, job_id)
            .await?
        {
            info!(candidate = %candidate.candidate_id, job = %job_id, "candidate already applied");
            return Ok(WizardSession::new(
                candidate,
                ApplicationWizard::submitted(job.summary()),
            ));
        }

        let profile = match self.profiles.fetch_profile(&candidate.candidate_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(candidate = %candidate.candidate_id, error = %err, "profile unavailable; starting with an empty draft");
                None
            }
        };

        let wizard = ApplicationWizard::new(
            job.summary(),
            profile,
            ValidationRules::from(&self.policy),
            ResumePolicy::from(&self.policy),
        );
        let session = WizardSession::new(candidate, wizard);
        info!(session = %session.id(), job = %job_id, "application wizard opened");
        Ok(session)
    }

    /// Run the submission procedure: resume upload, optional profile write, snapshot insert.
    ///
    /// Steps run strictly in order and the first failure aborts the rest, leaving the
    /// wizard at the review step with its draft intact.
    pub async fn submit(
        &self,
        session: &WizardSession,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let _guard = session
            .begin_submission()
            .ok_or(ApplicationServiceError::SubmissionInProgress)?;

        let candidate = session.candidate().clone();
        let pending = session.with_wizard(|wizard| wizard.prepare_submission(&candidate))?;

        if session.is_closed() {
            info!(session = %session.id(), "submission cancelled before upload");
            return Err(ApplicationServiceError::Cancelled);
        }

        let resume_url = match &pending.resume {
            Some(file) => {
                let path = upload_path(&candidate.candidate_id, &file.file_name, Utc::now());
                let stored = self
                    .documents
                    .upload(&self.policy.resume_bucket, &path, file)
                    .await
                    .map_err(|err| {
                        warn!(session = %session.id(), error = %err, "resume upload failed");
                        ApplicationServiceError::Upload(err)
                    })?;
                info!(session = %session.id(), path = %stored.path, "resume uploaded");
                session.with_wizard(|wizard| {
                    wizard.record_uploaded_resume(file, stored.public_url.clone())
                });
                Some(stored.public_url)
            }
            None => pending.known_resume_url.clone(),
        };

        if pending.draft.save_to_profile {
            let update = ProfileUpdate::Application {
                personal: pending.draft.personal_fields(),
                academic: pending.draft.academic_fields(),
                primary_resume_url: resume_url.clone(),
            };
            self.profiles
                .update_profile(&candidate.candidate_id, update)
                .await
                .map_err(|err| {
                    warn!(session = %session.id(), error = %err, "profile write failed");
                    ApplicationServiceError::ProfileWrite(err)
                })?;
            info!(session = %session.id(), "profile updated from application");
        }

        let snapshot = SubmissionSnapshot::capture(
            candidate.candidate_id.clone(),
            pending.job.id.clone(),
            pending.applicant_name,
            pending.applicant_email,
            &pending.draft,
            resume_url,
        );

        let record = match self.repository.insert(snapshot).await {
            Ok(record) => record,
            Err(RepositoryError::Conflict) => {
                warn!(session = %session.id(), job = %pending.job.id, "application already on record");
                session.with_wizard(ApplicationWizard::mark_submitted);
                return Err(ApplicationServiceError::Insert(RepositoryError::Conflict));
            }
            Err(err) => {
                error!(session = %session.id(), error = %err, "application insert failed");
                return Err(ApplicationServiceError::Insert(err));
            }
        };

        session.with_wizard(ApplicationWizard::mark_submitted);
        info!(
            session = %session.id(),
            application = %record.snapshot.application_id().0,
            job = %pending.job.id,
            "application submitted"
        );
        Ok(record)
    }

    /// Active job by id.
    pub async fn job(&self, job_id: &JobId) -> Result<JobListing, ApplicationServiceError> {
        self.catalog
            .fetch_job(job_id)
            .await?
            .ok_or_else(|| ApplicationServiceError::JobNotFound(job_id.clone()))
    }

    /// Active jobs matching `query`, newest first, plus the filter panel facets.
    pub async fn job_board(&self, query: &JobQuery) -> Result<JobBoard, ApplicationServiceError> {
        let jobs = self.catalog.active_jobs().await?;
        Ok(JobBoard::build(jobs, query))
    }
}

/// A candidate's applications, newest first, each joined with its job when the job still exists.
/// Closed roles keep their summary.
pub(crate) async fn application_history(
    repository: &dyn ApplicationRepository,
    catalog: &dyn JobCatalog,
    candidate: &CandidateId,
) -> Result<Vec<ApplicationHistoryEntry>, HistoryError> {
    let mut records = repository.for_candidate(candidate).await?;
    records.sort_by(|a, b| b.snapshot.submitted_at().cmp(&a.snapshot.submitted_at()));

    let mut entries = Vec::with_capacity(records.len());
    for record in &records {
        let job = catalog.find_job(record.snapshot.job_id()).await?;
        entries.push(record.history_entry(job.as_ref().map(JobListing::summary)));
    }
    Ok(entries)
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("job {0} was not found or is no longer accepting applications")]
    JobNotFound(JobId),
    #[error("a submission for this application is already in progress")]
    SubmissionInProgress,
    #[error("the application was closed before submission started")]
    Cancelled,
    #[error("resume upload failed: {0}")]
    Upload(StoreError),
    #[error("saving to profile failed: {0}")]
    ProfileWrite(StoreError),
    #[error("submitting application failed: {0}")]
    Insert(RepositoryError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
