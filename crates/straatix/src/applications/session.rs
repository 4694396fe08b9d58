use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::DraftApplication;
use super::validation::{FieldError, WizardStep};
use super::wizard::{ApplicationWizard, WizardError};
use crate::candidates::documents::AttachedFile;
use crate::candidates::domain::CandidateContext;
use crate::jobs::domain::JobSummary;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    pub fn next() -> Self {
        let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("wiz-{id:06}"))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One open wizard plus the flags that guard its submission.
#[derive(Debug)]
pub struct WizardSession {
    id: SessionId,
    candidate: CandidateContext,
    wizard: Mutex<ApplicationWizard>,
    submitting: AtomicBool,
    closed: AtomicBool,
    last_active: Mutex<Instant>,
}

impl WizardSession {
    pub fn new(candidate: CandidateContext, wizard: ApplicationWizard) -> Self {
        Self {
            id: SessionId::next(),
            candidate,
            wizard: Mutex::new(wizard),
            submitting: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn candidate(&self) -> &CandidateContext {
        &self.candidate
    }

    /// Runs `f` with exclusive access to the wizard. The lock is never held across an await.
    pub fn with_wizard<T>(&self, f: impl FnOnce(&mut ApplicationWizard) -> T) -> T {
        let mut wizard = self.wizard.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut wizard)
    }

    /// Like [`with_wizard`](Self::with_wizard) for candidate edits, which are refused while a
    /// submission is in flight. The flag is read under the wizard lock, so an edit either lands
    /// before the submission captures the draft or is rejected.
    pub fn edit<T>(
        &self,
        f: impl FnOnce(&mut ApplicationWizard) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let mut wizard = self.wizard.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_submitting() {
            return Err(WizardError::SubmissionInProgress);
        }
        f(&mut wizard)
    }

    pub fn view(&self) -> WizardView {
        self.with_wizard(|wizard| WizardView::new(&self.id, wizard, self.is_submitting()))
    }

    /// Claims the submit action. `None` while another submission is in flight.
    pub fn begin_submission(&self) -> Option<SubmissionGuard<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionGuard {
                flag: &self.submitting,
            })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Tears the session down. A submission that has not started uploading yet will abort.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Releases the submit action when dropped, whatever the outcome.
#[derive(Debug)]
pub struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Serializable picture of a wizard for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub session_id: SessionId,
    pub submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<WizardStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_title: Option<&'static str>,
    pub job: JobSummary,
    pub draft: DraftApplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_resume: Option<AttachedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_resume_url: Option<String>,
    pub field_errors: Vec<FieldError>,
    pub submitting: bool,
}

impl WizardView {
    fn new(id: &SessionId, wizard: &ApplicationWizard, submitting: bool) -> Self {
        Self {
            session_id: id.clone(),
            submitted: wizard.is_submitted(),
            step: wizard.current_step(),
            step_number: wizard.current_step().map(WizardStep::number),
            step_title: wizard.current_step().map(WizardStep::title),
            job: wizard.job().clone(),
            draft: wizard.draft().clone(),
            attached_resume: wizard.attached_resume(),
            existing_resume_url: wizard.existing_resume_url().map(str::to_string),
            field_errors: wizard.field_errors().to_vec(),
            submitting,
        }
    }
}

/// Open wizard sessions keyed by id.
///
/// Sessions leave the registry when closed, once submitted, or after sitting idle for longer
/// than the idle timeout. Idle sessions are pruned whenever a new one is inserted.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<WizardSession>>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn insert(&self, session: WizardSession) -> Arc<WizardSession> {
        self.prune_idle();
        let session = Arc::new(session);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id().clone(), Arc::clone(&session));
        session
    }

    /// Looks a session up and marks it active.
    pub fn get(&self, id: &SessionId) -> Option<Arc<WizardSession>> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    /// Removes and closes the session.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<WizardSession>> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(session) = &removed {
            session.close();
        }
        removed
    }

    /// Closes and drops every idle session that is not mid-submission. Returns how many went.
    pub fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.is_submitting() || session.idle_for() < self.idle_timeout;
            if !keep {
                session.close();
            }
            keep
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "idle wizard sessions pruned");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Self::DEFAULT_IDLE_TIMEOUT)
    }
}
