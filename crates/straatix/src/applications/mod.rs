//! Candidate application wizard: draft, step validation, submission and its HTTP surface.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationHistoryEntry, ApplicationId, ApplicationRecord, ApplicationStatus,
    DraftApplication, DraftPatch, SubmissionSnapshot,
};
pub use repository::{ApplicationRepository, RepositoryError};
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError, HistoryError};
pub use session::{SessionId, SessionRegistry, SubmissionGuard, WizardSession, WizardView};
pub use validation::{validate_step, DraftField, FieldError, StepValidation, ValidationRules, WizardStep};
pub use wizard::{ApplicationWizard, PendingSubmission, WizardError, WizardState};
