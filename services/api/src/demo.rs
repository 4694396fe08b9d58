use crate::infra::{load_jobs, InMemoryBackend};
use clap::Args;
use std::path::{Path, PathBuf};
use straatix::applications::{DraftPatch, WizardError, WizardStep};
use straatix::candidates::{CandidateContext, CandidateProfile, FileUpload};
use straatix::config::ApplicationPolicyConfig;
use straatix::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional CSV export used instead of the built-in job listings.
    #[arg(long)]
    pub(crate) jobs_csv: Option<PathBuf>,
    /// Resume to attach. The content type is guessed from the file extension.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { jobs_csv, resume } = args;

    println!("Straatix Partners application demo");
    let backend = InMemoryBackend::new(
        load_jobs(jobs_csv.as_deref())?,
        ApplicationPolicyConfig::default(),
    );
    let candidate = CandidateContext::new("cand-demo", "priya.nair@example.com");
    backend.profiles.seed(demo_profile(&candidate));

    let Some(job) = backend.catalog.first_active().cloned() else {
        println!("- No active jobs to apply to");
        return Ok(());
    };
    println!("- Applying to {} ({}, {})", job.title, job.location, job.job_type);

    let service = backend.application_service();
    let session = match service.open(candidate.clone(), &job.id).await {
        Ok(session) => session,
        Err(err) => {
            println!("  Wizard unavailable: {}", err);
            return Ok(());
        }
    };

    let resume = match resume {
        Some(path) => resume_from_path(&path)?,
        None => FileUpload::new(
            "priya-nair-resume.pdf",
            "application/pdf",
            b"%PDF-1.4\n% demo resume\n".to_vec(),
        ),
    };

    let walked = session.with_wizard(|wizard| -> Result<(), WizardError> {
        wizard.apply_patch(demo_patch())?;
        loop {
            match wizard.current_step() {
                Some(WizardStep::Review) | None => break,
                Some(WizardStep::Documents) if !wizard.has_resume() => {
                    wizard.attach_resume(resume.clone())?;
                    println!("  Attached {} ({} bytes)", resume.file_name, resume.size());
                }
                Some(step) => {
                    let next = wizard.advance()?;
                    println!("  Completed {} -> {}", step, next);
                }
            }
        }
        Ok(())
    });
    if let Err(err) = walked {
        println!("  Wizard stopped: {}", err);
        return Ok(());
    }

    let record = match service.submit(&session).await {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Submitted application {} -> status {}",
        record.snapshot.application_id().0,
        record.status.label()
    );
    match serde_json::to_string_pretty(&record.snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("  Snapshot unavailable: {}", err),
    }
    println!("- Documents stored: {}", backend.documents.object_count());

    match backend.account_service().application_history(&candidate).await {
        Ok(history) => {
            println!("Application history:");
            for entry in history {
                let title = entry
                    .job
                    .as_ref()
                    .map(|job| job.title.as_str())
                    .unwrap_or("(job removed)");
                println!(
                    "  - {} | {} | {} | {}",
                    entry.application_id.0,
                    title,
                    entry.status,
                    entry.applied_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        Err(err) => println!("  History unavailable: {}", err),
    }

    Ok(())
}

fn resume_from_path(path: &Path) -> Result<FileUpload, AppError> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    Ok(FileUpload::new(file_name, content_type, bytes))
}

fn demo_profile(candidate: &CandidateContext) -> CandidateProfile {
    let mut profile = CandidateProfile::new(candidate, "Priya Nair");
    profile.personal.nationality = Some("Indian".to_string());
    profile.personal.phone = Some("+91 98200 11223".to_string());
    profile.academic.degree_institution = Some("IIM Bangalore".to_string());
    profile.academic.degree_name = Some("MBA".to_string());
    profile
}

fn demo_patch() -> DraftPatch {
    DraftPatch {
        date_of_birth: Some("1987-09-21".to_string()),
        gender: Some("female".to_string()),
        address: Some("22 Carter Road, Bandra West, Mumbai".to_string()),
        class_x_school: Some("Cathedral School".to_string()),
        class_x_year: Some("2003".to_string()),
        class_x_percentage: Some("94.2".to_string()),
        class_xii_school: Some("Jai Hind College".to_string()),
        class_xii_year: Some("2005".to_string()),
        class_xii_percentage: Some("91.5".to_string()),
        degree_year: Some("2011".to_string()),
        degree_cgpa: Some("3.7".to_string()),
        current_company: Some("Horizon Capital".to_string()),
        current_ctc: Some("120".to_string()),
        expected_ctc: Some("150".to_string()),
        ..DraftPatch::default()
    }
}
