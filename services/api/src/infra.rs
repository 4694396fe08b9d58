use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use straatix::applications::{
    ApplicationRecord, ApplicationRepository, ApplicationService, RepositoryError,
    SubmissionSnapshot,
};
use straatix::candidates::{
    AccountService, CandidateContext, CandidateId, CandidateProfile, DocumentStore, FileUpload,
    ProfileStore, ProfileUpdate, StoreError, StoredDocument,
};
use straatix::config::ApplicationPolicyConfig;
use straatix::error::AppError;
use straatix::jobs::{CatalogError, JobCatalog, JobId, JobImporter, JobListing};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Profiles keyed by candidate. A write for an unknown candidate creates the row.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<CandidateId, CandidateProfile>>>,
}

impl InMemoryProfileStore {
    pub(crate) fn seed(&self, profile: CandidateProfile) {
        lock(&self.profiles).insert(profile.candidate_id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<CandidateProfile>, StoreError> {
        Ok(lock(&self.profiles).get(candidate).cloned())
    }

    async fn update_profile(
        &self,
        candidate: &CandidateId,
        update: ProfileUpdate,
    ) -> Result<(), StoreError> {
        let mut guard = lock(&self.profiles);
        let profile = guard.entry(candidate.clone()).or_insert_with(|| {
            CandidateProfile::new(&CandidateContext::new(candidate.0.clone(), ""), "")
        });
        profile.apply(update);
        Ok(())
    }
}

/// Keeps uploaded bytes in memory and hands out URLs under the configured public base.
#[derive(Clone)]
pub(crate) struct InMemoryDocumentStore {
    public_url: String,
    objects: Arc<Mutex<HashMap<String, FileUpload>>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
            objects: Arc::default(),
        }
    }

    pub(crate) fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &FileUpload,
    ) -> Result<StoredDocument, StoreError> {
        let key = format!("{bucket}/{path}");
        let mut guard = lock(&self.objects);
        if guard.contains_key(&key) {
            return Err(StoreError::Rejected(format!("object '{key}' already exists")));
        }
        guard.insert(key.clone(), file.clone());

        Ok(StoredDocument {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: format!("{}/{key}", self.public_url.trim_end_matches('/')),
        })
    }
}

/// Read-only catalog over a fixed set of listings, newest first.
#[derive(Clone)]
pub(crate) struct InMemoryJobCatalog {
    jobs: Arc<Vec<JobListing>>,
}

impl InMemoryJobCatalog {
    pub(crate) fn new(mut jobs: Vec<JobListing>) -> Self {
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            jobs: Arc::new(jobs),
        }
    }

    pub(crate) fn first_active(&self) -> Option<&JobListing> {
        self.jobs.iter().find(|job| job.is_active)
    }
}

#[async_trait]
impl JobCatalog for InMemoryJobCatalog {
    async fn fetch_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError> {
        Ok(self
            .jobs
            .iter()
            .find(|listing| &listing.id == job && listing.is_active)
            .cloned())
    }

    async fn active_jobs(&self) -> Result<Vec<JobListing>, CatalogError> {
        Ok(self
            .jobs
            .iter()
            .filter(|listing| listing.is_active)
            .cloned()
            .collect())
    }

    async fn find_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError> {
        Ok(self.jobs.iter().find(|listing| &listing.id == job).cloned())
    }

    async fn recent_jobs(&self, limit: usize) -> Result<Vec<JobListing>, CatalogError> {
        Ok(self.jobs.iter().take(limit).cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<Vec<ApplicationRecord>>>,
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(
        &self,
        snapshot: SubmissionSnapshot,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records);
        if guard.iter().any(|record| {
            record.snapshot.candidate_id() == snapshot.candidate_id()
                && record.snapshot.job_id() == snapshot.job_id()
        }) {
            return Err(RepositoryError::Conflict);
        }
        let record = ApplicationRecord::new(snapshot);
        guard.push(record.clone());
        Ok(record)
    }

    async fn has_existing_application(
        &self,
        candidate: &CandidateId,
        job: &JobId,
    ) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records).iter().any(|record| {
            record.snapshot.candidate_id() == candidate && record.snapshot.job_id() == job
        }))
    }

    async fn for_candidate(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let mut records: Vec<_> = lock(&self.records)
            .iter()
            .filter(|record| record.snapshot.candidate_id() == candidate)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.snapshot.submitted_at().cmp(&a.snapshot.submitted_at()));
        Ok(records)
    }
}

/// Every in-memory collaborator, shared between the application and account services.
#[derive(Clone)]
pub(crate) struct InMemoryBackend {
    pub(crate) profiles: InMemoryProfileStore,
    pub(crate) documents: InMemoryDocumentStore,
    pub(crate) catalog: InMemoryJobCatalog,
    pub(crate) applications: InMemoryApplicationRepository,
    pub(crate) policy: ApplicationPolicyConfig,
}

impl InMemoryBackend {
    pub(crate) fn new(jobs: Vec<JobListing>, policy: ApplicationPolicyConfig) -> Self {
        Self {
            profiles: InMemoryProfileStore::default(),
            documents: InMemoryDocumentStore::new(policy.storage_public_url.clone()),
            catalog: InMemoryJobCatalog::new(jobs),
            applications: InMemoryApplicationRepository::default(),
            policy,
        }
    }

    pub(crate) fn application_service(&self) -> ApplicationService {
        ApplicationService::new(
            Arc::new(self.profiles.clone()),
            Arc::new(self.documents.clone()),
            Arc::new(self.catalog.clone()),
            Arc::new(self.applications.clone()),
            self.policy.clone(),
        )
    }

    pub(crate) fn account_service(&self) -> AccountService {
        AccountService::new(
            Arc::new(self.profiles.clone()),
            Arc::new(self.documents.clone()),
            Arc::new(self.catalog.clone()),
            Arc::new(self.applications.clone()),
            self.policy.clone(),
        )
    }
}

/// Listings from a CSV export when one is given, otherwise the built-in openings.
pub(crate) fn load_jobs(jobs_csv: Option<&Path>) -> Result<Vec<JobListing>, AppError> {
    match jobs_csv {
        Some(path) => Ok(JobImporter::from_path(path)?),
        None => Ok(seed_jobs()),
    }
}

pub(crate) fn seed_jobs() -> Vec<JobListing> {
    let now = Utc::now();
    let listing = |id: &str,
                   title: &str,
                   location: &str,
                   job_type: &str,
                   job_function: &str,
                   minimum_experience: u32,
                   days_ago: i64| JobListing {
        id: JobId(id.to_string()),
        title: title.to_string(),
        location: location.to_string(),
        job_type: job_type.to_string(),
        job_function: job_function.to_string(),
        description: format!("{title} mandate handled by Straatix Partners for a growth-stage client."),
        minimum_experience,
        requirements: vec![format!("{minimum_experience}+ years of relevant experience")],
        responsibilities: vec!["Report directly to the founding team".to_string()],
        is_active: true,
        created_at: now - Duration::days(days_ago),
    };

    vec![
        listing("job-cfo-mumbai", "Chief Financial Officer", "Mumbai, India", "Full-time", "Finance", 15, 2),
        listing("job-vp-product", "VP Product", "Bengaluru, India", "Full-time", "Product", 10, 5),
        listing("job-hr-lead", "Head of People", "Gurugram, India", "Full-time", "HR", 8, 9),
        listing("job-strategy-analyst", "Strategy Analyst", "Remote", "Contract", "Consulting", 2, 14),
    ]
}
