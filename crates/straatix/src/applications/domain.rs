use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidates::domain::{AcademicFields, CandidateId, CandidateProfile, PersonalFields};
use crate::candidates::forms::{AcademicDraft, PersonalDraft};
use crate::jobs::domain::{JobId, JobSummary};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl ApplicationId {
    pub fn next() -> Self {
        let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }
}

/// Everything the candidate is editing across the wizard steps.
///
/// Numeric-looking fields stay as text until the draft is coerced at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftApplication {
    #[serde(flatten)]
    pub personal: PersonalDraft,
    #[serde(flatten)]
    pub academic: AcademicDraft,
    pub save_to_profile: bool,
}

impl Default for DraftApplication {
    fn default() -> Self {
        Self {
            personal: PersonalDraft::default(),
            academic: AcademicDraft::default(),
            save_to_profile: true,
        }
    }
}

impl DraftApplication {
    /// Draft pre-filled from the stored profile, or empty when there is none.
    pub fn from_profile(profile: Option<&CandidateProfile>) -> Self {
        match profile {
            Some(profile) => Self {
                personal: PersonalDraft::from_fields(&profile.personal),
                academic: AcademicDraft::from_fields(&profile.academic),
                save_to_profile: true,
            },
            None => Self::default(),
        }
    }

    pub fn personal_fields(&self) -> PersonalFields {
        self.personal.to_fields()
    }

    pub fn academic_fields(&self) -> AcademicFields {
        self.academic.to_fields()
    }
}

/// Partial edit of a draft; absent keys leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPatch {
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub class_x_school: Option<String>,
    pub class_x_year: Option<String>,
    pub class_x_percentage: Option<String>,
    pub class_xii_school: Option<String>,
    pub class_xii_year: Option<String>,
    pub class_xii_percentage: Option<String>,
    pub degree_institution: Option<String>,
    pub degree_name: Option<String>,
    pub degree_year: Option<String>,
    pub degree_cgpa: Option<String>,
    pub current_company: Option<String>,
    pub current_ctc: Option<String>,
    pub expected_ctc: Option<String>,
    pub save_to_profile: Option<bool>,
}

impl DraftPatch {
    pub fn apply_to(self, draft: &mut DraftApplication) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        let personal = &mut draft.personal;
        set(&mut personal.phone, self.phone);
        set(&mut personal.date_of_birth, self.date_of_birth);
        set(&mut personal.nationality, self.nationality);
        set(&mut personal.gender, self.gender);
        set(&mut personal.address, self.address);

        let academic = &mut draft.academic;
        set(&mut academic.class_x_school, self.class_x_school);
        set(&mut academic.class_x_year, self.class_x_year);
        set(&mut academic.class_x_percentage, self.class_x_percentage);
        set(&mut academic.class_xii_school, self.class_xii_school);
        set(&mut academic.class_xii_year, self.class_xii_year);
        set(&mut academic.class_xii_percentage, self.class_xii_percentage);
        set(&mut academic.degree_institution, self.degree_institution);
        set(&mut academic.degree_name, self.degree_name);
        set(&mut academic.degree_year, self.degree_year);
        set(&mut academic.degree_cgpa, self.degree_cgpa);
        set(&mut academic.current_company, self.current_company);
        set(&mut academic.current_ctc, self.current_ctc);
        set(&mut academic.expected_ctc, self.expected_ctc);

        if let Some(save) = self.save_to_profile {
            draft.save_to_profile = save;
        }
    }
}

/// Point-in-time copy of a submitted application.
///
/// Fields are private: a snapshot is built once by [`SubmissionSnapshot::capture`] and
/// afterwards only read, so later profile edits never reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSnapshot {
    application_id: ApplicationId,
    candidate_id: CandidateId,
    job_id: JobId,
    name: String,
    email: String,
    personal: PersonalFields,
    academic: AcademicFields,
    resume_url: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl SubmissionSnapshot {
    pub fn capture(
        candidate_id: CandidateId,
        job_id: JobId,
        name: String,
        email: String,
        draft: &DraftApplication,
        resume_url: Option<String>,
    ) -> Self {
        Self {
            application_id: ApplicationId::next(),
            candidate_id,
            job_id,
            name,
            email,
            personal: draft.personal_fields(),
            academic: draft.academic_fields(),
            resume_url: resume_url.filter(|url| !url.trim().is_empty()),
            submitted_at: Utc::now(),
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn personal(&self) -> &PersonalFields {
        &self.personal
    }

    pub fn academic(&self) -> &AcademicFields {
        &self.academic
    }

    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// Recruiter-side progress of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    UnderReview,
    Shortlisted,
    InterviewScheduled,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
        }
    }
}

/// Stored application: the immutable snapshot plus its current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub snapshot: SubmissionSnapshot,
    pub status: ApplicationStatus,
}

impl ApplicationRecord {
    pub fn new(snapshot: SubmissionSnapshot) -> Self {
        Self {
            snapshot,
            status: ApplicationStatus::Applied,
        }
    }

    pub fn history_entry(&self, job: Option<JobSummary>) -> ApplicationHistoryEntry {
        ApplicationHistoryEntry {
            application_id: self.snapshot.application_id().clone(),
            job_id: self.snapshot.job_id().clone(),
            status: self.status.label(),
            applied_at: self.snapshot.submitted_at(),
            job,
        }
    }
}

/// Row of the account area's application history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationHistoryEntry {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSummary>,
}
