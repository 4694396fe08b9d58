use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{JobId, JobListing, DEFAULT_JOB_FUNCTION};

#[derive(Debug)]
pub enum JobImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for JobImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobImportError::Io(err) => write!(f, "failed to read job export: {}", err),
            JobImportError::Csv(err) => write!(f, "invalid job CSV data: {}", err),
            JobImportError::InvalidRow { line, reason } => {
                write!(f, "job export line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for JobImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobImportError::Io(err) => Some(err),
            JobImportError::Csv(err) => Some(err),
            JobImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for JobImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for JobImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads job listings from a CSV export of the catalog.
///
/// Expected headers: `id,title,location,job_type,job_function,description,minimum_experience,created_at`.
/// Optional columns (`job_function`, `minimum_experience`, `requirements`, `responsibilities`,
/// `is_active`, `created_at`) may be blank or absent; requirement and
/// responsibility lists are `;`-separated when present.
pub struct JobImporter;

impl JobImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<JobListing>, JobImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<JobListing>, JobImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut listings = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let row: JobRow = record.deserialize(Some(&headers))?;
            listings.push(row.into_listing(line)?);
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }
}

#[derive(Debug, Deserialize)]
struct JobRow {
    id: String,
    title: String,
    location: String,
    job_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    job_function: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    minimum_experience: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    requirements: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    responsibilities: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_active: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl JobRow {
    fn into_listing(self, line: u64) -> Result<JobListing, JobImportError> {
        if self.id.is_empty() || self.title.is_empty() {
            return Err(JobImportError::InvalidRow {
                line,
                reason: "id and title are required".to_string(),
            });
        }

        let minimum_experience = match self.minimum_experience.as_deref() {
            Some(raw) => raw.parse::<u32>().map_err(|_| JobImportError::InvalidRow {
                line,
                reason: format!("minimum_experience '{raw}' is not a whole number"),
            })?,
            None => 0,
        };

        let is_active = match self.is_active.as_deref() {
            Some(raw) => !matches!(raw.to_ascii_lowercase().as_str(), "false" | "no" | "0"),
            None => true,
        };

        Ok(JobListing {
            id: JobId(self.id),
            title: self.title,
            location: self.location,
            job_type: self.job_type,
            job_function: self
                .job_function
                .unwrap_or_else(|| DEFAULT_JOB_FUNCTION.to_string()),
            description: self.description,
            minimum_experience,
            requirements: split_list(self.requirements.as_deref()),
            responsibilities: split_list(self.responsibilities.as_deref()),
            is_active,
            created_at: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_default(),
        })
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXPORT: &str = "id,title,location,job_type,job_function,description,minimum_experience,requirements,created_at\n\
job-1,Chief Financial Officer,\"Mumbai, India\",Full-time,Finance,Lead finance,15,CA;MBA,2025-01-10\n\
job-2,Product Lead,\"Bengaluru, India\",Full-time,,Own the roadmap,,,2025-03-01T09:00:00Z\n";

    #[test]
    fn imports_rows_newest_first_with_defaults() {
        let jobs = JobImporter::from_reader(Cursor::new(EXPORT)).expect("import succeeds");
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, JobId("job-2".to_string()));
        assert_eq!(jobs[0].job_function, DEFAULT_JOB_FUNCTION);
        assert_eq!(jobs[0].minimum_experience, 0);
        assert!(jobs[0].is_active);
        assert_eq!(jobs[1].requirements, vec!["CA", "MBA"]);
        assert_eq!(jobs[1].city(), "Mumbai");
    }

    #[test]
    fn rejects_non_numeric_experience() {
        let csv = "id,title,location,job_type,description,minimum_experience\njob-9,Analyst,Pune,Contract,Numbers,lots\n";
        match JobImporter::from_reader(Cursor::new(csv)) {
            Err(JobImportError::InvalidRow { reason, .. }) => assert!(reason.contains("lots")),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn from_path_propagates_io_errors() {
        match JobImporter::from_path("./does-not-exist.csv") {
            Err(JobImportError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
