use tracing::debug;

use super::domain::{DraftApplication, DraftPatch};
use super::validation::{validate_step, FieldError, StepValidation, ValidationRules, WizardStep};
use crate::candidates::documents::{AttachedFile, FileUpload, ResumePolicy, ResumeRejection};
use crate::candidates::domain::{CandidateContext, CandidateProfile};
use crate::jobs::domain::JobSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Editing(WizardStep),
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("{step} has {} invalid field(s)", errors.len())]
    Incomplete {
        step: WizardStep,
        errors: Vec<FieldError>,
    },
    #[error("Resume required: please upload your resume to continue")]
    ResumeRequired,
    #[error(transparent)]
    Resume(#[from] ResumeRejection),
    #[error("already at the first step")]
    AtFirstStep,
    #[error("already at the final step; submit the application instead")]
    AtFinalStep,
    #[error("cannot jump from {current} ahead to {target}")]
    SkipAhead {
        current: WizardStep,
        target: WizardStep,
    },
    #[error("application has already been submitted")]
    AlreadySubmitted,
    #[error("applications can only be submitted from the review step")]
    NotReviewed,
    #[error("a submission for this application is already in progress")]
    SubmissionInProgress,
}

/// Everything the submission procedure needs, captured while the wizard is locked.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub job: JobSummary,
    pub applicant_name: String,
    pub applicant_email: String,
    pub draft: DraftApplication,
    /// Newly attached file that still has to be uploaded.
    pub resume: Option<FileUpload>,
    /// URL to use when no upload is needed: a previous attempt's upload or the profile resume.
    pub known_resume_url: Option<String>,
}

/// Four-step application flow for one candidate and one job.
///
/// Forward moves are gated by the current step's validation; backward moves
/// never are. The draft is shared by all steps and survives every failure.
#[derive(Debug, Clone)]
pub struct ApplicationWizard {
    job: JobSummary,
    profile: Option<CandidateProfile>,
    draft: DraftApplication,
    state: WizardState,
    resume: Option<FileUpload>,
    uploaded_resume_url: Option<String>,
    field_errors: Vec<FieldError>,
    rules: ValidationRules,
    resume_policy: ResumePolicy,
}

impl ApplicationWizard {
    /// Opens at the first step with the draft pre-filled from `profile`.
    pub fn new(
        job: JobSummary,
        profile: Option<CandidateProfile>,
        rules: ValidationRules,
        resume_policy: ResumePolicy,
    ) -> Self {
        let draft = DraftApplication::from_profile(profile.as_ref());
        Self {
            job,
            profile,
            draft,
            state: WizardState::Editing(WizardStep::PersonalInfo),
            resume: None,
            uploaded_resume_url: None,
            field_errors: Vec::new(),
            rules,
            resume_policy,
        }
    }

    /// Wizard for a job the candidate has already applied to; no steps are shown.
    pub fn submitted(job: JobSummary) -> Self {
        let mut wizard = Self::new(job, None, ValidationRules::default(), ResumePolicy::default());
        wizard.state = WizardState::Submitted;
        wizard
    }

    pub fn job(&self) -> &JobSummary {
        &self.job
    }

    pub fn profile(&self) -> Option<&CandidateProfile> {
        self.profile.as_ref()
    }

    pub fn draft(&self) -> &DraftApplication {
        &self.draft
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_step(&self) -> Option<WizardStep> {
        match self.state {
            WizardState::Editing(step) => Some(step),
            WizardState::Submitted => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state == WizardState::Submitted
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn attached_resume(&self) -> Option<AttachedFile> {
        self.resume.as_ref().map(FileUpload::describe)
    }

    pub fn existing_resume_url(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|profile| profile.primary_resume_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// A newly attached file or a resume already on the profile.
    pub fn has_resume(&self) -> bool {
        self.resume.is_some() || self.existing_resume_url().is_some()
    }

    pub fn draft_mut(&mut self) -> Result<&mut DraftApplication, WizardError> {
        self.ensure_editing()?;
        Ok(&mut self.draft)
    }

    pub fn apply_patch(&mut self, patch: DraftPatch) -> Result<(), WizardError> {
        patch.apply_to(self.draft_mut()?);
        Ok(())
    }

    /// Validates and attaches a resume. A rejected file leaves the previous attachment in place.
    pub fn attach_resume(&mut self, file: FileUpload) -> Result<(), WizardError> {
        self.ensure_editing()?;
        if let Err(rejection) = self.resume_policy.check(&file) {
            debug!(file = %file.file_name, %rejection, "resume rejected");
            return Err(rejection.into());
        }

        debug!(file = %file.file_name, size = file.size(), "resume attached");
        self.resume = Some(file);
        self.uploaded_resume_url = None;
        Ok(())
    }

    pub fn detach_resume(&mut self) -> Result<(), WizardError> {
        self.ensure_editing()?;
        self.resume = None;
        self.uploaded_resume_url = None;
        Ok(())
    }

    /// Re-checks the current step's gate without moving.
    pub fn validate_current(&self) -> StepValidation {
        match self.state {
            WizardState::Editing(step) => self.validate(step),
            WizardState::Submitted => StepValidation::default(),
        }
    }

    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        let current = self.editing_step()?;
        let next = current.next().ok_or(WizardError::AtFinalStep)?;

        self.check_gate(current)?;
        self.state = WizardState::Editing(next);
        debug!(from = current.number(), to = next.number(), "wizard advanced");
        Ok(next)
    }

    pub fn retreat(&mut self) -> Result<WizardStep, WizardError> {
        let current = self.editing_step()?;
        let previous = current.previous().ok_or(WizardError::AtFirstStep)?;

        self.field_errors.clear();
        self.state = WizardState::Editing(previous);
        debug!(from = current.number(), to = previous.number(), "wizard retreated");
        Ok(previous)
    }

    /// Moves to an already reached step. Jumping forward is never allowed.
    pub fn jump_to(&mut self, target: WizardStep) -> Result<WizardStep, WizardError> {
        let current = self.editing_step()?;
        if target > current {
            debug!(current = current.number(), target = target.number(), "forward jump refused");
            return Err(WizardError::SkipAhead { current, target });
        }

        self.field_errors.clear();
        self.state = WizardState::Editing(target);
        Ok(target)
    }

    /// Re-checks every gate and captures the submission inputs. Only valid at the review step,
    /// and the wizard stays there whatever the outcome.
    pub fn prepare_submission(&mut self, candidate: &CandidateContext) -> Result<PendingSubmission, WizardError> {
        if self.editing_step()? != WizardStep::Review {
            return Err(WizardError::NotReviewed);
        }

        for step in [
            WizardStep::PersonalInfo,
            WizardStep::Professional,
            WizardStep::Documents,
        ] {
            self.check_gate(step)?;
        }

        let (applicant_name, applicant_email) = match &self.profile {
            Some(profile) => (
                profile.full_name.clone(),
                Some(profile.email.clone())
                    .filter(|email| !email.trim().is_empty())
                    .unwrap_or_else(|| candidate.email.clone()),
            ),
            None => (String::new(), candidate.email.clone()),
        };

        let known_resume_url = self
            .uploaded_resume_url
            .clone()
            .or_else(|| self.existing_resume_url().map(str::to_string));

        Ok(PendingSubmission {
            job: self.job.clone(),
            applicant_name,
            applicant_email,
            draft: self.draft.clone(),
            resume: self.resume.clone().filter(|_| self.uploaded_resume_url.is_none()),
            known_resume_url,
        })
    }

    /// Remembers a successful upload so a retry does not upload the same file again.
    ///
    /// Ignored when `uploaded` is no longer the attached file, so a replacement attached while
    /// the upload ran is still uploaded on the next attempt.
    pub fn record_uploaded_resume(&mut self, uploaded: &FileUpload, url: String) -> bool {
        if self.resume.as_ref() != Some(uploaded) {
            debug!(file = %uploaded.file_name, "attachment changed during upload; url not kept");
            return false;
        }
        self.uploaded_resume_url = Some(url);
        true
    }

    pub fn mark_submitted(&mut self) {
        self.field_errors.clear();
        self.state = WizardState::Submitted;
    }

    fn validate(&self, step: WizardStep) -> StepValidation {
        validate_step(step, &self.draft, self.has_resume(), &self.rules)
    }

    fn check_gate(&mut self, step: WizardStep) -> Result<(), WizardError> {
        let outcome = self.validate(step);
        if !outcome.errors.is_empty() {
            debug!(step = step.number(), errors = outcome.errors.len(), "step gate failed");
            self.field_errors = outcome.errors.clone();
            return Err(WizardError::Incomplete {
                step,
                errors: outcome.errors,
            });
        }
        if outcome.resume_missing {
            debug!(step = step.number(), "resume gate failed");
            self.field_errors.clear();
            return Err(WizardError::ResumeRequired);
        }

        self.field_errors.clear();
        Ok(())
    }

    fn editing_step(&self) -> Result<WizardStep, WizardError> {
        self.current_step().ok_or(WizardError::AlreadySubmitted)
    }

    fn ensure_editing(&self) -> Result<(), WizardError> {
        self.editing_step().map(|_| ())
    }
}
