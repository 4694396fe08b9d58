use std::sync::atomic::Ordering;
use std::time::Duration;

use super::common::*;

use crate::applications::domain::{ApplicationRecord, DraftPatch, SubmissionSnapshot};
use crate::applications::repository::RepositoryError;
use crate::applications::service::ApplicationServiceError;
use crate::applications::session::WizardSession;
use crate::applications::validation::WizardStep;
use crate::applications::wizard::WizardError;
use crate::candidates::account::{AccountError, DetailsError};
use crate::candidates::documents::FileUpload;
use crate::candidates::domain::ProfileUpdate;
use crate::candidates::forms::{AcademicDraft, PersonalDetailsForm};
use crate::candidates::store::StoreError;
use crate::jobs::domain::JobId;

async fn session_at_review(fixture: &Fixture) -> WizardSession {
    let session = fixture
        .service
        .open(candidate(), &cfo_job_id())
        .await
        .expect("wizard opens");
    session.with_wizard(|wizard| {
        wizard.apply_patch(personal_patch()).expect("editable");
        wizard.apply_patch(professional_patch()).expect("editable");
        wizard.advance().expect("personal info");
        wizard.advance().expect("professional");
        wizard.attach_resume(pdf(2 * 1024 * 1024)).expect("valid pdf");
        wizard.advance().expect("documents");
    });
    session
}

#[tokio::test]
async fn happy_path_stores_coerced_snapshot_and_profile() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;

    let record = fixture.service.submit(&session).await.expect("submission succeeds");

    let snapshot = &record.snapshot;
    assert_eq!(snapshot.job_id(), &cfo_job_id());
    assert_eq!(snapshot.name(), "Asha Verma");
    assert_eq!(snapshot.email(), "asha.verma@example.com");
    assert_eq!(snapshot.personal().phone.as_deref(), Some("9876543210"));
    assert_eq!(snapshot.academic().class_x_year, Some(2010));
    assert_eq!(snapshot.academic().class_x_percentage, Some(90.0));
    assert_eq!(snapshot.academic().class_xii_percentage, Some(92.0));
    assert_eq!(snapshot.academic().degree_year, Some(2016));
    assert_eq!(snapshot.academic().degree_cgpa, Some(8.5));
    assert_eq!(snapshot.academic().current_ctc, None);
    assert_eq!(record.status.label(), "Applied");

    let uploads = fixture.documents.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bucket, "resumes");
    assert!(uploads[0].path.starts_with("cand-001/"));
    assert!(uploads[0].path.ends_with("-resume.pdf"));
    assert_eq!(snapshot.resume_url(), Some(uploads[0].public_url.as_str()));

    let profile = fixture.profiles.get(&candidate().candidate_id).expect("profile");
    assert_eq!(&profile.personal, snapshot.personal());
    assert_eq!(&profile.academic, snapshot.academic());
    assert_eq!(profile.primary_resume_url.as_deref(), snapshot.resume_url());

    assert_eq!(fixture.applications.records().len(), 1);
    assert!(session.with_wizard(|wizard| wizard.is_submitted()));
}

#[tokio::test]
async fn unchecked_save_to_profile_leaves_profile_untouched() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    session.with_wizard(|wizard| {
        wizard
            .apply_patch(DraftPatch {
                save_to_profile: Some(false),
                ..DraftPatch::default()
            })
            .expect("editable")
    });

    fixture.service.submit(&session).await.expect("submission succeeds");

    assert!(fixture.profiles.writes().is_empty());
    assert_eq!(fixture.applications.records().len(), 1);
}

#[tokio::test]
async fn snapshot_is_unaffected_by_later_profile_edits() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    let record = fixture.service.submit(&session).await.expect("submission succeeds");

    fixture
        .accounts()
        .update_personal_details(
            &candidate(),
            PersonalDetailsForm {
                full_name: "Asha V. Rao".to_string(),
                ..PersonalDetailsForm::default()
            },
        )
        .await
        .expect("profile edit");

    let stored = fixture.applications.records();
    assert_eq!(stored[0], record);
    assert_eq!(stored[0].snapshot.name(), "Asha Verma");
    assert_eq!(stored[0].snapshot.personal().phone.as_deref(), Some("9876543210"));
}

#[tokio::test]
async fn concurrent_submissions_produce_one_record() {
    let fixture = Fixture::with_stores(
        MemoryProfiles::with_profile(stored_profile()),
        MemoryDocuments::slow(),
    );
    let session = session_at_review(&fixture).await;

    let (first, second) = tokio::join!(
        fixture.service.submit(&session),
        fixture.service.submit(&session)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(ApplicationServiceError::SubmissionInProgress)
    )));
    assert_eq!(fixture.applications.records().len(), 1);
    assert_eq!(fixture.documents.uploads().len(), 1);
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn upload_failure_aborts_before_profile_and_insert() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    fixture.documents.fail_uploads.store(true, Ordering::SeqCst);

    match fixture.service.submit(&session).await {
        Err(ApplicationServiceError::Upload(StoreError::Rejected(message))) => {
            assert!(message.contains("bucket policy"));
        }
        other => panic!("expected upload failure, got {other:?}"),
    }

    assert!(fixture.profiles.writes().is_empty());
    assert!(fixture.applications.records().is_empty());
    session.with_wizard(|wizard| {
        assert_eq!(wizard.current_step(), Some(WizardStep::Review));
        assert_eq!(wizard.draft().personal.phone, "9876543210");
        assert!(wizard.attached_resume().is_some());
    });

    fixture.documents.fail_uploads.store(false, Ordering::SeqCst);
    fixture.service.submit(&session).await.expect("retry succeeds");
    assert_eq!(fixture.applications.records().len(), 1);
}

#[tokio::test]
async fn retry_after_insert_failure_reuses_the_uploaded_resume() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    fixture.applications.fail_inserts.store(true, Ordering::SeqCst);

    assert!(matches!(
        fixture.service.submit(&session).await,
        Err(ApplicationServiceError::Insert(RepositoryError::Unavailable(_)))
    ));
    assert_eq!(fixture.documents.uploads().len(), 1);
    assert_eq!(
        session.with_wizard(|wizard| wizard.current_step()),
        Some(WizardStep::Review)
    );

    fixture.applications.fail_inserts.store(false, Ordering::SeqCst);
    let record = fixture.service.submit(&session).await.expect("retry succeeds");

    let uploads = fixture.documents.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(record.snapshot.resume_url(), Some(uploads[0].public_url.as_str()));
}

fn named_pdf(name: &str) -> FileUpload {
    FileUpload::new(name, "application/pdf", vec![b'%'; 4096])
}

#[tokio::test]
async fn edits_are_refused_while_the_submission_uploads() {
    let fixture = Fixture::with_stores(
        MemoryProfiles::with_profile(stored_profile()),
        MemoryDocuments::slow(),
    );
    let session = session_at_review(&fixture).await;
    fixture.applications.fail_inserts.store(true, Ordering::SeqCst);

    let (submitted, edited) = tokio::join!(fixture.service.submit(&session), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.edit(|wizard| wizard.attach_resume(named_pdf("new.pdf")))
    });

    assert!(matches!(submitted, Err(ApplicationServiceError::Insert(_))));
    assert_eq!(edited, Err(WizardError::SubmissionInProgress));
    assert_eq!(
        session.view().attached_resume.map(|file| file.file_name),
        Some("resume.pdf".to_string())
    );

    session
        .edit(|wizard| wizard.attach_resume(named_pdf("new.pdf")))
        .expect("editable once the submission settles");
}

#[tokio::test]
async fn replacement_attached_during_upload_is_uploaded_on_retry() {
    let fixture = Fixture::with_stores(
        MemoryProfiles::with_profile(stored_profile()),
        MemoryDocuments::slow(),
    );
    let session = session_at_review(&fixture).await;
    session.with_wizard(|wizard| wizard.attach_resume(named_pdf("old.pdf")).expect("valid pdf"));
    fixture.applications.fail_inserts.store(true, Ordering::SeqCst);

    let (submitted, ()) = tokio::join!(fixture.service.submit(&session), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.with_wizard(|wizard| wizard.attach_resume(named_pdf("new.pdf")).expect("valid pdf"));
    });
    assert!(matches!(submitted, Err(ApplicationServiceError::Insert(_))));
    assert_eq!(fixture.documents.uploads().len(), 1);
    assert!(fixture.documents.uploads()[0].path.ends_with("-old.pdf"));

    fixture.applications.fail_inserts.store(false, Ordering::SeqCst);
    let record = fixture.service.submit(&session).await.expect("retry succeeds");

    let uploads = fixture.documents.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads[1].path.ends_with("-new.pdf"));
    assert_eq!(record.snapshot.resume_url(), Some(uploads[1].public_url.as_str()));
}

#[tokio::test]
async fn profile_write_failure_aborts_the_insert() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    fixture.profiles.fail_writes.store(true, Ordering::SeqCst);

    assert!(matches!(
        fixture.service.submit(&session).await,
        Err(ApplicationServiceError::ProfileWrite(_))
    ));
    assert!(fixture.applications.records().is_empty());
    assert!(!session.with_wizard(|wizard| wizard.is_submitted()));
}

#[tokio::test]
async fn closed_session_cancels_before_upload() {
    let fixture = Fixture::new();
    let session = session_at_review(&fixture).await;
    session.close();

    assert!(matches!(
        fixture.service.submit(&session).await,
        Err(ApplicationServiceError::Cancelled)
    ));
    assert!(fixture.documents.uploads().is_empty());
    assert!(fixture.applications.records().is_empty());
}

#[tokio::test]
async fn submit_outside_review_is_refused() {
    let fixture = Fixture::new();
    let session = fixture
        .service
        .open(candidate(), &cfo_job_id())
        .await
        .expect("wizard opens");

    assert!(matches!(
        fixture.service.submit(&session).await,
        Err(ApplicationServiceError::Wizard(WizardError::NotReviewed))
    ));
}

#[tokio::test]
async fn existing_profile_resume_is_reused_without_upload() {
    let mut profile = stored_profile();
    profile.primary_resume_url = Some("https://files.test/resumes/cand-001/old.pdf".to_string());
    let fixture = Fixture::with_stores(MemoryProfiles::with_profile(profile), MemoryDocuments::default());

    let session = fixture
        .service
        .open(candidate(), &cfo_job_id())
        .await
        .expect("wizard opens");
    session.with_wizard(|wizard| {
        wizard.apply_patch(personal_patch()).expect("editable");
        wizard.apply_patch(professional_patch()).expect("editable");
        for _ in 0..3 {
            wizard.advance().expect("gates pass");
        }
    });

    let record = fixture.service.submit(&session).await.expect("submission succeeds");
    assert!(fixture.documents.uploads().is_empty());
    assert_eq!(
        record.snapshot.resume_url(),
        Some("https://files.test/resumes/cand-001/old.pdf")
    );
}

#[tokio::test]
async fn duplicate_application_opens_in_submitted_state() {
    let fixture = Fixture::new();
    let draft = crate::applications::domain::DraftApplication::default();
    fixture.applications.seed(ApplicationRecord::new(SubmissionSnapshot::capture(
        candidate().candidate_id,
        cfo_job_id(),
        "Asha Verma".to_string(),
        candidate().email,
        &draft,
        None,
    )));

    let session = fixture
        .service
        .open(candidate(), &cfo_job_id())
        .await
        .expect("wizard opens");

    assert!(session.with_wizard(|wizard| wizard.is_submitted()));
    assert_eq!(session.view().step, None);
}

#[tokio::test]
async fn unknown_or_inactive_job_is_not_found() {
    let fixture = Fixture::new();

    for job in ["job-missing", "job-archived"] {
        match fixture.service.open(candidate(), &JobId(job.to_string())).await {
            Err(ApplicationServiceError::JobNotFound(id)) => assert_eq!(id.0, job),
            other => panic!("expected job not found, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn unavailable_profile_store_yields_an_empty_draft() {
    let profiles = MemoryProfiles::with_profile(stored_profile());
    profiles.fail_fetch.store(true, Ordering::SeqCst);
    let fixture = Fixture::with_stores(profiles, MemoryDocuments::default());

    let session = fixture
        .service
        .open(candidate(), &cfo_job_id())
        .await
        .expect("wizard still opens");

    let view = session.view();
    assert_eq!(view.step, Some(WizardStep::PersonalInfo));
    assert_eq!(view.draft.personal.nationality, "");
}

fn seed_application(fixture: &Fixture, job: &str) {
    fixture.applications.seed(ApplicationRecord::new(SubmissionSnapshot::capture(
        candidate().candidate_id,
        JobId(job.to_string()),
        "Asha Verma".to_string(),
        candidate().email,
        &crate::applications::domain::DraftApplication::default(),
        None,
    )));
}

#[tokio::test]
async fn history_lists_newest_first_with_job_summary() {
    let fixture = Fixture::new();
    for job in ["job-cfo", "job-cpo", "job-archived"] {
        seed_application(&fixture, job);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let history = fixture
        .accounts()
        .application_history(&candidate())
        .await
        .expect("history loads");

    assert_eq!(history.len(), 3);
    assert_eq!(history[1].job_id.0, "job-cpo");
    assert_eq!(history[1].status, "Applied");
    assert_eq!(
        history[1].job.as_ref().map(|job| job.title.as_str()),
        Some("Chief Product Officer")
    );
    assert_eq!(history[0].job_id.0, "job-archived");
    assert_eq!(
        history[0].job.as_ref().map(|job| job.title.as_str()),
        Some("Head of Treasury")
    );
}

#[tokio::test]
async fn dashboard_shows_latest_applications_and_open_roles() {
    let fixture = Fixture::new();
    for n in 0..6 {
        seed_application(&fixture, &format!("job-{n}"));
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let dashboard = fixture.accounts().dashboard(&candidate()).await.expect("dashboard loads");

    assert_eq!(dashboard.profile_completion, 40);
    let recent: Vec<&str> = dashboard
        .recent_applications
        .iter()
        .map(|entry| entry.job_id.0.as_str())
        .collect();
    assert_eq!(recent, vec!["job-5", "job-4", "job-3", "job-2", "job-1"]);
    let recommended: Vec<&str> = dashboard.recommended_jobs.iter().map(|job| job.id.0.as_str()).collect();
    assert_eq!(recommended, vec!["job-cpo", "job-cfo"]);
}

#[tokio::test]
async fn dashboard_recommends_recent_listings_when_nothing_is_open() {
    let fixture = Fixture::with_stores(MemoryProfiles::default(), MemoryDocuments::default());
    fixture.catalog.deactivate_all();

    let dashboard = fixture.accounts().dashboard(&candidate()).await.expect("dashboard loads");

    assert_eq!(dashboard.profile_completion, 0);
    assert!(dashboard.recent_applications.is_empty());
    let recommended: Vec<&str> = dashboard.recommended_jobs.iter().map(|job| job.id.0.as_str()).collect();
    assert_eq!(recommended, vec!["job-cpo", "job-cfo", "job-archived"]);
}

#[tokio::test]
async fn account_rejects_single_character_names() {
    let fixture = Fixture::new();

    let result = fixture
        .accounts()
        .update_personal_details(
            &candidate(),
            PersonalDetailsForm {
                full_name: " A ".to_string(),
                ..PersonalDetailsForm::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(AccountError::Details(DetailsError::NameTooShort { min: 2 }))
    ));
    assert!(fixture.profiles.writes().is_empty());
}

#[tokio::test]
async fn account_academic_update_coerces_numbers() {
    let fixture = Fixture::new();

    fixture
        .accounts()
        .update_academic_details(
            &candidate(),
            AcademicDraft {
                degree_year: "2016".to_string(),
                degree_cgpa: "n/a".to_string(),
                current_ctc: " 42.5 ".to_string(),
                ..AcademicDraft::default()
            },
        )
        .await
        .expect("update succeeds");

    let profile = fixture.profiles.get(&candidate().candidate_id).expect("profile");
    assert_eq!(profile.academic.degree_year, Some(2016));
    assert_eq!(profile.academic.degree_cgpa, None);
    assert_eq!(profile.academic.current_ctc, Some(42.5));
}

#[tokio::test]
async fn account_resume_replace_and_remove() {
    let fixture = Fixture::new();
    let accounts = fixture.accounts();

    let stored = accounts
        .replace_resume(&candidate(), pdf(4096))
        .await
        .expect("resume replaced");
    let profile = fixture.profiles.get(&candidate().candidate_id).expect("profile");
    assert_eq!(profile.primary_resume_url, Some(stored.public_url));

    assert!(matches!(
        accounts.replace_resume(&candidate(), pdf(6 * 1024 * 1024)).await,
        Err(AccountError::Resume(_))
    ));

    accounts.remove_resume(&candidate()).await.expect("resume removed");
    assert_eq!(
        fixture.profiles.writes().last(),
        Some(&ProfileUpdate::PrimaryResume(None))
    );
}

#[tokio::test]
async fn account_profile_image_must_be_an_image() {
    let fixture = Fixture::new();
    let accounts = fixture.accounts();

    assert!(matches!(
        accounts.upload_profile_image(&candidate(), pdf(128)).await,
        Err(AccountError::Image(_))
    ));

    let stored = accounts
        .upload_profile_image(&candidate(), FileUpload::new("me.png", "image/png", vec![0u8; 128]))
        .await
        .expect("image uploaded");
    assert_eq!(stored.bucket, "profile-images");
    let profile = accounts.profile(&candidate()).await.expect("fetch").expect("profile");
    assert_eq!(profile.profile_image_url, Some(stored.public_url));
}
