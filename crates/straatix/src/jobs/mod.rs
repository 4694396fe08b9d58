//! Open positions: catalog contract, listing search and CSV seeding.

pub mod catalog;
pub mod domain;
pub mod import;
pub mod search;

pub use catalog::{CatalogError, JobCatalog};
pub use domain::{JobId, JobListing, JobSummary, JOB_FUNCTIONS, JOB_TYPES};
pub use import::{JobImportError, JobImporter};
pub use search::{available_locations, FacetCount, JobBoard, JobQuery, JobStats};
