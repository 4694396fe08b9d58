use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for open positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_JOB_FUNCTION: &str = "General";

/// Employment types offered in the filter panel.
pub const JOB_TYPES: &[&str] = &["Full-time", "Part-time", "Contract", "Internship", "Remote"];

/// Job functions offered in the filter panel.
pub const JOB_FUNCTIONS: &[&str] = &[
    "Engineering",
    "Product",
    "Design",
    "Marketing",
    "Sales",
    "Finance",
    "Operations",
    "HR",
    "Consulting",
    DEFAULT_JOB_FUNCTION,
];

/// Open position as published in the job catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub job_type: String,
    pub job_function: String,
    pub description: String,
    pub minimum_experience: u32,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl JobListing {
    /// City portion of the location, i.e. everything before the first comma.
    pub fn city(&self) -> &str {
        self.location
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            location: self.location.clone(),
            job_type: self.job_type.clone(),
        }
    }
}

/// Header information shown by the application wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub job_type: String,
}
