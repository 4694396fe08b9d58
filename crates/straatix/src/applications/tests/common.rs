use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::applications::domain::{ApplicationRecord, DraftPatch, SubmissionSnapshot};
use crate::applications::repository::{ApplicationRepository, RepositoryError};
use crate::applications::service::ApplicationService;
use crate::candidates::account::AccountService;
use crate::candidates::documents::FileUpload;
use crate::candidates::domain::{CandidateContext, CandidateId, CandidateProfile, ProfileUpdate};
use crate::candidates::store::{DocumentStore, ProfileStore, StoreError, StoredDocument};
use crate::config::ApplicationPolicyConfig;
use crate::jobs::catalog::{CatalogError, JobCatalog};
use crate::jobs::domain::{JobId, JobListing};

pub(super) fn candidate() -> CandidateContext {
    CandidateContext::new("cand-001", "asha.verma@example.com")
}

pub(super) fn stored_profile() -> CandidateProfile {
    let mut profile = CandidateProfile::new(&candidate(), "Asha Verma");
    profile.personal.nationality = Some("Indian".to_string());
    profile.academic.class_x_percentage = Some(90.0);
    profile.academic.degree_cgpa = Some(8.5);
    profile
}

pub(super) fn job_listing(id: &str, title: &str, location: &str) -> JobListing {
    JobListing {
        id: JobId(id.to_string()),
        title: title.to_string(),
        location: location.to_string(),
        job_type: "Full-time".to_string(),
        job_function: "Finance".to_string(),
        description: format!("{title} for a portfolio company"),
        minimum_experience: 10,
        requirements: vec!["CA or MBA".to_string()],
        responsibilities: vec!["Own the finance function".to_string()],
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).single().expect("valid timestamp"),
    }
}

pub(super) fn cfo_job_id() -> JobId {
    JobId("job-cfo".to_string())
}

pub(super) fn pdf(size: usize) -> FileUpload {
    FileUpload::new("resume.pdf", "application/pdf", vec![b'%'; size])
}

pub(super) fn personal_patch() -> DraftPatch {
    DraftPatch {
        phone: Some("9876543210".to_string()),
        date_of_birth: Some("1995-01-01".to_string()),
        nationality: Some("Indian".to_string()),
        gender: Some("male".to_string()),
        address: Some("123 Main St".to_string()),
        ..DraftPatch::default()
    }
}

pub(super) fn professional_patch() -> DraftPatch {
    DraftPatch {
        class_x_school: Some("ABC School".to_string()),
        class_x_year: Some("2010".to_string()),
        class_x_percentage: Some("90".to_string()),
        class_xii_school: Some("XYZ School".to_string()),
        class_xii_year: Some("2012".to_string()),
        class_xii_percentage: Some("92".to_string()),
        degree_institution: Some("IIT Delhi".to_string()),
        degree_name: Some("B.Tech".to_string()),
        degree_year: Some("2016".to_string()),
        degree_cgpa: Some("8.5".to_string()),
        ..DraftPatch::default()
    }
}

pub(super) fn policy() -> ApplicationPolicyConfig {
    ApplicationPolicyConfig {
        storage_public_url: "https://files.test".to_string(),
        ..ApplicationPolicyConfig::default()
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: Mutex<HashMap<CandidateId, CandidateProfile>>,
    pub(super) fail_fetch: AtomicBool,
    pub(super) fail_writes: AtomicBool,
    writes: Mutex<Vec<ProfileUpdate>>,
}

impl MemoryProfiles {
    pub(super) fn with_profile(profile: CandidateProfile) -> Self {
        let store = Self::default();
        store
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.candidate_id.clone(), profile);
        store
    }

    pub(super) fn get(&self, candidate: &CandidateId) -> Option<CandidateProfile> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(candidate)
            .cloned()
    }

    pub(super) fn writes(&self) -> Vec<ProfileUpdate> {
        self.writes.lock().expect("profile mutex poisoned").clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn fetch_profile(&self, candidate: &CandidateId) -> Result<Option<CandidateProfile>, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".to_string()));
        }
        Ok(self.get(candidate))
    }

    async fn update_profile(&self, candidate: &CandidateId, update: ProfileUpdate) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".to_string()));
        }
        self.writes
            .lock()
            .expect("profile mutex poisoned")
            .push(update.clone());
        let mut profiles = self.profiles.lock().expect("profile mutex poisoned");
        let profile = profiles.get_mut(candidate).ok_or(StoreError::NotFound)?;
        profile.apply(update);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryDocuments {
    uploads: Mutex<Vec<StoredDocument>>,
    pub(super) fail_uploads: AtomicBool,
    pub(super) delay: Option<Duration>,
}

impl MemoryDocuments {
    pub(super) fn slow() -> Self {
        Self {
            delay: Some(Duration::from_millis(25)),
            ..Self::default()
        }
    }

    pub(super) fn uploads(&self) -> Vec<StoredDocument> {
        self.uploads.lock().expect("document mutex poisoned").clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn upload(&self, bucket: &str, path: &str, _file: &FileUpload) -> Result<StoredDocument, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("new row violates bucket policy".to_string()));
        }

        let stored = StoredDocument {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: format!("https://files.test/{bucket}/{path}"),
        };
        self.uploads
            .lock()
            .expect("document mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }
}

pub(super) struct MemoryCatalog {
    jobs: Mutex<Vec<JobListing>>,
}

impl MemoryCatalog {
    pub(super) fn deactivate_all(&self) {
        for job in self.jobs.lock().expect("catalog mutex poisoned").iter_mut() {
            job.is_active = false;
        }
    }

    fn listings(&self) -> Vec<JobListing> {
        self.jobs.lock().expect("catalog mutex poisoned").clone()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        let mut archived = job_listing("job-archived", "Head of Treasury", "Pune, India");
        archived.is_active = false;
        let mut product = job_listing("job-cpo", "Chief Product Officer", "Bengaluru, India");
        product.job_function = "Product".to_string();
        product.created_at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).single().expect("valid timestamp");

        Self {
            jobs: Mutex::new(vec![
                product,
                job_listing("job-cfo", "Chief Financial Officer", "Mumbai, India"),
                archived,
            ]),
        }
    }
}

#[async_trait]
impl JobCatalog for MemoryCatalog {
    async fn fetch_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError> {
        Ok(self
            .listings()
            .into_iter()
            .find(|listing| &listing.id == job && listing.is_active))
    }

    async fn active_jobs(&self) -> Result<Vec<JobListing>, CatalogError> {
        Ok(self.listings().into_iter().filter(|listing| listing.is_active).collect())
    }

    async fn find_job(&self, job: &JobId) -> Result<Option<JobListing>, CatalogError> {
        Ok(self.listings().into_iter().find(|listing| &listing.id == job))
    }

    async fn recent_jobs(&self, limit: usize) -> Result<Vec<JobListing>, CatalogError> {
        let mut jobs = self.listings();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<Vec<ApplicationRecord>>,
    pub(super) fail_inserts: AtomicBool,
}

impl MemoryApplications {
    pub(super) fn records(&self) -> Vec<ApplicationRecord> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }

    pub(super) fn seed(&self, record: ApplicationRecord) {
        self.records.lock().expect("repository mutex poisoned").push(record);
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplications {
    async fn insert(&self, snapshot: SubmissionSnapshot) -> Result<ApplicationRecord, RepositoryError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("database offline".to_string()));
        }
        let mut records = self.records.lock().expect("repository mutex poisoned");
        if records.iter().any(|record| {
            record.snapshot.candidate_id() == snapshot.candidate_id()
                && record.snapshot.job_id() == snapshot.job_id()
        }) {
            return Err(RepositoryError::Conflict);
        }
        let record = ApplicationRecord::new(snapshot);
        records.push(record.clone());
        Ok(record)
    }

    async fn has_existing_application(&self, candidate: &CandidateId, job: &JobId) -> Result<bool, RepositoryError> {
        Ok(self.records().iter().any(|record| {
            record.snapshot.candidate_id() == candidate && record.snapshot.job_id() == job
        }))
    }

    async fn for_candidate(&self, candidate: &CandidateId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let mut records: Vec<_> = self
            .records()
            .into_iter()
            .filter(|record| record.snapshot.candidate_id() == candidate)
            .collect();
        records.sort_by(|a, b| b.snapshot.submitted_at().cmp(&a.snapshot.submitted_at()));
        Ok(records)
    }
}

pub(super) struct Fixture {
    pub(super) service: Arc<ApplicationService>,
    pub(super) profiles: Arc<MemoryProfiles>,
    pub(super) documents: Arc<MemoryDocuments>,
    pub(super) catalog: Arc<MemoryCatalog>,
    pub(super) applications: Arc<MemoryApplications>,
}

impl Fixture {
    pub(super) fn new() -> Self {
        Self::with_stores(
            MemoryProfiles::with_profile(stored_profile()),
            MemoryDocuments::default(),
        )
    }

    pub(super) fn with_stores(profiles: MemoryProfiles, documents: MemoryDocuments) -> Self {
        let profiles = Arc::new(profiles);
        let documents = Arc::new(documents);
        let catalog = Arc::new(MemoryCatalog::default());
        let applications = Arc::new(MemoryApplications::default());
        let service = Arc::new(ApplicationService::new(
            profiles.clone(),
            documents.clone(),
            catalog.clone(),
            applications.clone(),
            policy(),
        ));

        Self {
            service,
            profiles,
            documents,
            catalog,
            applications,
        }
    }

    pub(super) fn accounts(&self) -> AccountService {
        AccountService::new(
            self.profiles.clone(),
            self.documents.clone(),
            self.catalog.clone(),
            self.applications.clone(),
            policy(),
        )
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
