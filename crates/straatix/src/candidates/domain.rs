use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an authenticated candidate account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the signed-in candidate, passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContext {
    pub candidate_id: CandidateId,
    pub email: String,
}

impl CandidateContext {
    pub fn new(candidate_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            candidate_id: CandidateId(candidate_id.into()),
            email: email.into(),
        }
    }
}

/// Contact details held on the candidate profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalFields {
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

/// Schooling, degree and compensation details in their stored (typed) form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicFields {
    pub class_x_school: Option<String>,
    pub class_x_year: Option<i32>,
    pub class_x_percentage: Option<f64>,
    pub class_xii_school: Option<String>,
    pub class_xii_year: Option<i32>,
    pub class_xii_percentage: Option<f64>,
    pub degree_institution: Option<String>,
    pub degree_name: Option<String>,
    pub degree_year: Option<i32>,
    pub degree_cgpa: Option<f64>,
    pub current_company: Option<String>,
    pub current_ctc: Option<f64>,
    pub expected_ctc: Option<f64>,
}

/// Stored candidate profile as returned by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub email: String,
    pub personal: PersonalFields,
    pub academic: AcademicFields,
    pub primary_resume_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateProfile {
    /// Fresh profile for a newly registered candidate.
    pub fn new(candidate: &CandidateContext, full_name: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate.candidate_id.clone(),
            full_name: full_name.into(),
            email: candidate.email.clone(),
            personal: PersonalFields::default(),
            academic: AcademicFields::default(),
            primary_resume_url: None,
            profile_image_url: None,
            updated_at: Utc::now(),
        }
    }

    /// Share of the dashboard's key fields that are filled in, as a whole percentage:
    /// name, email, phone, primary resume and degree institution.
    pub fn completion_percent(&self) -> u8 {
        let filled = |value: Option<&str>| value.is_some_and(|text| !text.trim().is_empty());
        let fields = [
            filled(Some(self.full_name.as_str())),
            filled(Some(self.email.as_str())),
            filled(self.personal.phone.as_deref()),
            filled(self.primary_resume_url.as_deref()),
            filled(self.academic.degree_institution.as_deref()),
        ];
        let done = fields.iter().filter(|done| **done).count();
        (done * 100 / fields.len()) as u8
    }

    /// Apply a typed update. Every store implementation funnels writes through here.
    pub fn apply(&mut self, update: ProfileUpdate) {
        match update {
            ProfileUpdate::Application {
                personal,
                academic,
                primary_resume_url,
            } => {
                self.personal = personal;
                self.academic = academic;
                self.primary_resume_url = primary_resume_url;
            }
            ProfileUpdate::PersonalDetails {
                full_name,
                personal,
            } => {
                self.full_name = full_name;
                self.personal = personal;
            }
            ProfileUpdate::AcademicDetails(academic) => self.academic = academic,
            ProfileUpdate::PrimaryResume(url) => self.primary_resume_url = url,
            ProfileUpdate::ProfileImage(url) => self.profile_image_url = Some(url),
        }
        self.updated_at = Utc::now();
    }
}

/// Write operations accepted by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ProfileUpdate {
    /// Full overwrite issued by a submitted application with "save to profile" checked.
    Application {
        personal: PersonalFields,
        academic: AcademicFields,
        primary_resume_url: Option<String>,
    },
    PersonalDetails {
        full_name: String,
        personal: PersonalFields,
    },
    AcademicDetails(AcademicFields),
    PrimaryResume(Option<String>),
    ProfileImage(String),
}
