//! Candidate identity, stored profile data and the account area.

pub mod account;
pub mod documents;
pub mod domain;
pub mod forms;
pub mod router;
pub mod store;

pub use account::{AccountError, AccountService, Dashboard, DetailsError};
pub use documents::{
    check_profile_image, upload_path, AttachedFile, FileUpload, ImageRejection, ResumePolicy,
    ResumeRejection,
};
pub use domain::{
    AcademicFields, CandidateContext, CandidateId, CandidateProfile, PersonalFields, ProfileUpdate,
};
pub use forms::{AcademicDraft, PersonalDetailsForm, PersonalDraft};
pub use router::{
    account_router, AccountState, CANDIDATE_EMAIL_HEADER, CANDIDATE_ID_HEADER, FILE_NAME_HEADER,
};
pub use store::{DocumentStore, ProfileStore, StoreError, StoredDocument};
