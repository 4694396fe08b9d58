use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationRecord, DraftPatch};
use super::repository::RepositoryError;
use super::service::{ApplicationService, ApplicationServiceError};
use super::session::{SessionId, SessionRegistry, WizardSession};
use super::validation::WizardStep;
use super::wizard::WizardError;
use crate::candidates::router::{candidate_from_headers, resume_upload, upload_body_limit};
use crate::jobs::domain::JobId;
use crate::jobs::search::JobQuery;

#[derive(Clone)]
pub struct ApplyState {
    service: Arc<ApplicationService>,
    sessions: Arc<SessionRegistry>,
}

/// Router builder exposing the job board and the application wizard.
pub fn application_router(service: Arc<ApplicationService>, sessions: Arc<SessionRegistry>) -> Router {
    let body_limit = upload_body_limit(service.policy().resume_max_bytes);

    Router::new()
        .route("/api/v1/jobs", get(list_jobs_handler))
        .route("/api/v1/jobs/:job_id", get(job_handler))
        .route("/api/v1/jobs/:job_id/apply", post(open_handler))
        .route(
            "/api/v1/apply/:session_id",
            get(view_handler).delete(close_handler),
        )
        .route(
            "/api/v1/apply/:session_id/draft",
            patch(draft_handler),
        )
        .route(
            "/api/v1/apply/:session_id/resume",
            put(attach_resume_handler).delete(detach_resume_handler),
        )
        .route("/api/v1/apply/:session_id/next", post(next_handler))
        .route("/api/v1/apply/:session_id/back", post(back_handler))
        .route("/api/v1/apply/:session_id/steps/:step", post(jump_handler))
        .route("/api/v1/apply/:session_id/submit", post(submit_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ApplyState { service, sessions })
}

/// Raw query string of the job board; list filters are comma separated.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobSearchParams {
    search: Option<String>,
    job_types: Option<String>,
    locations: Option<String>,
    functions: Option<String>,
    max_experience: Option<u32>,
}

impl JobSearchParams {
    fn into_query(self) -> JobQuery {
        fn split(raw: Option<String>) -> Vec<String> {
            raw.map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
        }

        JobQuery {
            search: self.search,
            job_types: split(self.job_types),
            locations: split(self.locations),
            functions: split(self.functions),
            max_experience: self.max_experience,
        }
    }
}

pub(crate) async fn list_jobs_handler(
    State(state): State<ApplyState>,
    Query(params): Query<JobSearchParams>,
) -> Response {
    match state.service.job_board(&params.into_query()).await {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn job_handler(
    State(state): State<ApplyState>,
    Path(job_id): Path<String>,
) -> Response {
    match state.service.job(&JobId(job_id)).await {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn open_handler(
    State(state): State<ApplyState>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.service.open(candidate, &JobId(job_id)).await {
        Ok(session) => {
            let session = state.sessions.insert(session);
            (StatusCode::CREATED, Json(session.view())).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn view_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match session_for(&state, &headers, session_id) {
        Ok(session) => (StatusCode::OK, Json(session.view())).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn close_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match session_for(&state, &headers, session_id) {
        Ok(session) => {
            state.sessions.remove(session.id());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn draft_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(changes): Json<DraftPatch>,
) -> Response {
    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.apply_patch(changes))
    })
}

pub(crate) async fn attach_resume_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let file = match resume_upload(&headers, body, state.service.policy().resume_max_bytes) {
        Ok(file) => file,
        Err(response) => return response,
    };

    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.attach_resume(file))
    })
}

pub(crate) async fn detach_resume_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.detach_resume())
    })
}

pub(crate) async fn next_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.advance().map(|_| ()))
    })
}

pub(crate) async fn back_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.retreat().map(|_| ()))
    })
}

pub(crate) async fn jump_handler(
    State(state): State<ApplyState>,
    Path((session_id, step)): Path<(String, u8)>,
    headers: HeaderMap,
) -> Response {
    let Some(target) = WizardStep::from_number(step) else {
        let payload = json!({
            "error": format!("unknown wizard step {step}"),
        });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    wizard_action(&state, &headers, session_id, |session| {
        session.edit(|wizard| wizard.jump_to(target).map(|_| ()))
    })
}

pub(crate) async fn submit_handler(
    State(state): State<ApplyState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let session = match session_for(&state, &headers, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let outcome = state.service.submit(&session).await;
    // A submitted wizard has nothing left to edit; later lookups answer 404.
    if session.with_wizard(|wizard| wizard.is_submitted()) {
        state.sessions.remove(session.id());
    }

    match outcome {
        Ok(record) => (StatusCode::CREATED, Json(receipt(&record))).into_response(),
        Err(err) => service_error_response(err),
    }
}

fn receipt(record: &ApplicationRecord) -> serde_json::Value {
    json!({
        "application_id": record.snapshot.application_id(),
        "status": record.status.label(),
        "snapshot": record.snapshot,
    })
}

fn wizard_action(
    state: &ApplyState,
    headers: &HeaderMap,
    session_id: String,
    action: impl FnOnce(&WizardSession) -> Result<(), WizardError>,
) -> Response {
    let session = match session_for(state, headers, session_id) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match action(&session) {
        Ok(()) => (StatusCode::OK, Json(session.view())).into_response(),
        Err(err) => wizard_error_response(err),
    }
}

fn session_for(
    state: &ApplyState,
    headers: &HeaderMap,
    session_id: String,
) -> Result<Arc<WizardSession>, Response> {
    let candidate = candidate_from_headers(headers)?;
    let id = SessionId(session_id);

    // Sessions owned by another candidate are reported exactly like missing ones.
    match state.sessions.get(&id) {
        Some(session) if session.candidate().candidate_id == candidate.candidate_id => Ok(session),
        _ => {
            let payload = json!({
                "error": "application session not found",
                "session_id": id.0,
            });
            Err((StatusCode::NOT_FOUND, Json(payload)).into_response())
        }
    }
}

fn wizard_error_response(error: WizardError) -> Response {
    match error {
        WizardError::Incomplete { step, errors } => {
            let payload = json!({
                "error": format!("please complete {step}"),
                "step": step,
                "field_errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        WizardError::AlreadySubmitted | WizardError::SubmissionInProgress => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

fn service_error_response(error: ApplicationServiceError) -> Response {
    let error = match error {
        ApplicationServiceError::Wizard(inner) => return wizard_error_response(inner),
        other => other,
    };

    let status = match &error {
        ApplicationServiceError::Wizard(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationServiceError::JobNotFound(_) => StatusCode::NOT_FOUND,
        ApplicationServiceError::SubmissionInProgress
        | ApplicationServiceError::Cancelled
        | ApplicationServiceError::Insert(RepositoryError::Conflict)
        | ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationServiceError::Upload(_)
        | ApplicationServiceError::ProfileWrite(_)
        | ApplicationServiceError::Insert(_)
        | ApplicationServiceError::Catalog(_)
        | ApplicationServiceError::Repository(_) => StatusCode::BAD_GATEWAY,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
