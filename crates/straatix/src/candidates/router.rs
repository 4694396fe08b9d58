use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use super::account::{AccountError, AccountService};
use super::documents::{FileUpload, ResumeRejection};
use super::domain::CandidateContext;
use super::forms::{AcademicDraft, PersonalDetailsForm};
use super::store::StoreError;

pub const CANDIDATE_ID_HEADER: &str = "x-candidate-id";
pub const CANDIDATE_EMAIL_HEADER: &str = "x-candidate-email";
pub const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Clone)]
pub struct AccountState {
    accounts: Arc<AccountService>,
}

/// Router builder for the signed-in candidate's account area.
pub fn account_router(accounts: Arc<AccountService>) -> Router {
    let body_limit = upload_body_limit(accounts.policy().resume_max_bytes);

    Router::new()
        .route("/api/v1/account/profile", get(profile_handler))
        .route("/api/v1/account/personal-details", put(personal_details_handler))
        .route("/api/v1/account/academic-details", put(academic_details_handler))
        .route(
            "/api/v1/account/resume",
            put(replace_resume_handler).delete(remove_resume_handler),
        )
        .route("/api/v1/account/profile-image", put(profile_image_handler))
        .route("/api/v1/account/applications", get(history_handler))
        .route("/api/v1/account/dashboard", get(dashboard_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AccountState { accounts })
}

pub(crate) async fn profile_handler(State(state): State<AccountState>, headers: HeaderMap) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.profile(&candidate).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => account_error_response(AccountError::Store(StoreError::NotFound)),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn personal_details_handler(
    State(state): State<AccountState>,
    headers: HeaderMap,
    Json(form): Json<PersonalDetailsForm>,
) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.update_personal_details(&candidate, form).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn academic_details_handler(
    State(state): State<AccountState>,
    headers: HeaderMap,
    Json(form): Json<AcademicDraft>,
) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.update_academic_details(&candidate, form).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn replace_resume_handler(
    State(state): State<AccountState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };
    let file = match resume_upload(&headers, body, state.accounts.policy().resume_max_bytes) {
        Ok(file) => file,
        Err(response) => return response,
    };

    match state.accounts.replace_resume(&candidate, file).await {
        Ok(stored) => (StatusCode::OK, Json(stored)).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn remove_resume_handler(State(state): State<AccountState>, headers: HeaderMap) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.remove_resume(&candidate).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn profile_image_handler(
    State(state): State<AccountState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };
    let file = file_upload(&headers, body, "profile-image");

    match state.accounts.upload_profile_image(&candidate, file).await {
        Ok(stored) => (StatusCode::OK, Json(stored)).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn history_handler(State(state): State<AccountState>, headers: HeaderMap) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.application_history(&candidate).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "applications": entries }))).into_response(),
        Err(err) => account_error_response(err),
    }
}

pub(crate) async fn dashboard_handler(State(state): State<AccountState>, headers: HeaderMap) -> Response {
    let candidate = match candidate_from_headers(&headers) {
        Ok(candidate) => candidate,
        Err(response) => return response,
    };

    match state.accounts.dashboard(&candidate).await {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => account_error_response(err),
    }
}

/// Request body cap for upload routes: room for a resume over the limit, so the resume policy
/// can still report its exact size.
pub(crate) fn upload_body_limit(resume_max_bytes: u64) -> usize {
    usize::try_from(resume_max_bytes.saturating_mul(2)).unwrap_or(usize::MAX)
}

/// Reads a resume body. A body over the route's cap is answered like any other oversized
/// resume (422 with the policy message) instead of a bare 413.
pub(crate) fn resume_upload(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    max_bytes: u64,
) -> Result<FileUpload, Response> {
    match body {
        Ok(bytes) => Ok(file_upload(headers, bytes, "resume")),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let size_bytes = header_text(headers, header::CONTENT_LENGTH.as_str())
                .and_then(|length| length.parse::<u64>().ok())
                .unwrap_or_else(|| max_bytes.saturating_add(1));
            let rejection = ResumeRejection::TooLarge {
                size_bytes,
                max_bytes,
            };
            let payload = json!({
                "error": rejection.to_string(),
            });
            Err((StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response())
        }
        Err(rejection) => Err(rejection.into_response()),
    }
}

pub(crate) fn file_upload(headers: &HeaderMap, body: Bytes, default_name: &str) -> FileUpload {
    let content_type = header_text(headers, header::CONTENT_TYPE.as_str()).unwrap_or_default();
    let file_name = header_text(headers, FILE_NAME_HEADER).unwrap_or_else(|| default_name.to_string());
    FileUpload::new(file_name, content_type, body)
}

pub(crate) fn candidate_from_headers(headers: &HeaderMap) -> Result<CandidateContext, Response> {
    match header_text(headers, CANDIDATE_ID_HEADER) {
        Some(candidate_id) => {
            let email = header_text(headers, CANDIDATE_EMAIL_HEADER).unwrap_or_default();
            Ok(CandidateContext::new(candidate_id, email))
        }
        None => {
            let payload = json!({
                "error": "sign in to continue",
            });
            Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
        }
    }
}

pub(crate) fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn account_error_response(error: AccountError) -> Response {
    let status = match &error {
        AccountError::Details(_) | AccountError::Resume(_) | AccountError::Image(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AccountError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        AccountError::Store(_) | AccountError::History(_) | AccountError::Catalog(_) => {
            StatusCode::BAD_GATEWAY
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
