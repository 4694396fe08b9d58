use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::JobListing;

/// Search text plus the filter panel selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub job_types: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    /// Candidate's years of experience; jobs requiring more are hidden.
    #[serde(default)]
    pub max_experience: Option<u32>,
}

impl JobQuery {
    /// Whether any filter panel control is engaged. The search box does not count.
    pub fn has_active_filters(&self) -> bool {
        !self.job_types.is_empty()
            || !self.locations.is_empty()
            || !self.functions.is_empty()
            || self.max_experience.is_some()
    }

    pub fn matches(&self, job: &JobListing) -> bool {
        self.matches_search(job)
            && (self.job_types.is_empty() || self.job_types.contains(&job.job_type))
            && self.matches_location(job)
            && (self.functions.is_empty() || self.functions.contains(&job.job_function))
            && self
                .max_experience
                .map_or(true, |years| job.minimum_experience <= years)
    }

    pub fn apply<'a>(&self, jobs: &'a [JobListing]) -> Vec<&'a JobListing> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }

    fn matches_search(&self, job: &JobListing) -> bool {
        let Some(search) = self.search.as_deref().map(str::trim) else {
            return true;
        };
        if search.is_empty() {
            return true;
        }

        let needle = search.to_lowercase();
        job.title.to_lowercase().contains(&needle)
            || job.location.to_lowercase().contains(&needle)
            || job.description.to_lowercase().contains(&needle)
    }

    fn matches_location(&self, job: &JobListing) -> bool {
        if self.locations.is_empty() {
            return true;
        }

        let location = job.location.to_lowercase();
        let city = job.city();
        self.locations
            .iter()
            .any(|selected| location.contains(&selected.to_lowercase()) || city == selected.as_str())
    }
}

/// Filtered listing page together with the facets the filter panel needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobBoard {
    pub jobs: Vec<JobListing>,
    pub available_locations: Vec<String>,
    pub has_active_filters: bool,
    pub stats: JobStats,
}

impl JobBoard {
    /// Locations and stats are computed over every job, not only the ones that survive the filter.
    pub fn build(jobs: Vec<JobListing>, query: &JobQuery) -> Self {
        let available_locations = available_locations(&jobs);
        let stats = JobStats::collect(&jobs);
        Self {
            jobs: jobs.into_iter().filter(|job| query.matches(job)).collect(),
            available_locations,
            has_active_filters: query.has_active_filters(),
            stats,
        }
    }
}

/// How many listings share one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub name: String,
    pub count: usize,
}

/// Headline numbers shown above the job board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub open_positions: usize,
    pub location_count: usize,
    pub job_type_count: usize,
    /// Busiest cities, at most [`JobStats::TOP_LOCATIONS`].
    pub top_locations: Vec<FacetCount>,
    pub by_job_type: Vec<FacetCount>,
}

impl JobStats {
    pub const TOP_LOCATIONS: usize = 5;

    pub fn collect(jobs: &[JobListing]) -> Self {
        let locations = tally(jobs.iter().map(JobListing::city));
        let job_types = tally(jobs.iter().map(|job| job.job_type.as_str()));

        Self {
            open_positions: jobs.len(),
            location_count: locations.len(),
            job_type_count: job_types.len(),
            top_locations: locations.into_iter().take(Self::TOP_LOCATIONS).collect(),
            by_job_type: job_types,
        }
    }
}

/// Counts per value, largest first; ties are ordered by name.
fn tally<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FacetCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(name, count)| FacetCount {
            name: name.to_string(),
            count,
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    facets
}

/// Distinct cities across the listings, in first-seen order.
pub fn available_locations(jobs: &[JobListing]) -> Vec<String> {
    let mut cities: Vec<String> = Vec::new();
    for job in jobs {
        let city = job.city();
        if !cities.iter().any(|known| known == city) {
            cities.push(city.to_string());
        }
    }
    cities
}
