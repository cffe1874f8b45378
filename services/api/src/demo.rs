use crate::infra::{InMemoryNotificationOutbox, InMemoryWorkflowStore};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::sync::Arc;
use thiqax::config::WorkflowConfig;
use thiqax::error::AppError;
use thiqax::workflows::verification::{
    Actor, Application, ApplicationId, Clock, Document, DocumentId, DocumentStatus, DocumentType,
    EducationEntry, EligibilityReport, ExperienceEntry, ExpirySweepSummary, IntegrationError, Job,
    JobId, KycStatus, KycStatusView, NotFoundError, Notification, PersonalInfo, Profile,
    ProfileId, RepositoryError, Role, User, UserId, VerificationRequest, VerificationService,
    VerificationStatus, WorkflowStore,
};

const SEEKER: &str = "seeker-1";
const SPONSOR: &str = "sponsor-1";
const PROFILE: &str = "profile-1";
const JOB: &str = "job-icu";
const APPLICATION: &str = "app-1";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the demo (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Look-ahead window for expiry reminders, in days.
    #[arg(long)]
    pub(crate) expiry_window_days: Option<i64>,
}

struct DemoClock(DateTime<Utc>);

impl Clock for DemoClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Snapshots captured while the scenario runs.
struct DemoOutcome {
    eligibility_before: EligibilityReport,
    kyc_after_identity: KycStatus,
    kyc_after_address: KycStatus,
    rejected_notes: Option<String>,
    application: Application,
    eligibility_after: EligibilityReport,
    sweep: ExpirySweepSummary,
    kyc_view: KycStatusView,
    notifications: Vec<Notification>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let now = today
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
        .and_utc();
    let mut config = WorkflowConfig::default();
    if let Some(days) = args.expiry_window_days {
        config.expiry_window_days = days;
    }

    let store = Arc::new(InMemoryWorkflowStore::default());
    seed_demo_records(&store, now).map_err(IntegrationError::from)?;
    let outbox = Arc::new(InMemoryNotificationOutbox::default());
    let service = VerificationService::with_clock(
        store,
        outbox.clone(),
        config,
        Arc::new(DemoClock(now)),
    );

    let outcome = run_scenario(&service, &outbox)?;
    render(today, &outcome);
    Ok(())
}

/// Load a job seeker with a complete profile, a sponsor's job posting, an open application
/// and a handful of uploaded documents.
pub(crate) fn seed_demo_records(
    store: &InMemoryWorkflowStore,
    now: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    let users = [
        (SEEKER, Role::JobSeeker, "Amina Okafor", Some(false)),
        (SPONSOR, Role::Sponsor, "Gulf Care Hospitals", None),
        ("agent-1", Role::Agent, "Horizon Recruitment", None),
        ("admin-1", Role::Admin, "ThiQaX Operations", None),
    ];
    for (id, role, name, kyc_verified) in users {
        store.insert_user(User {
            id: UserId::from(id),
            role,
            name: name.to_string(),
            email: format!("{id}@thiqax.test"),
            kyc_verified,
        })?;
    }

    let mut profile = Profile::new(PROFILE, UserId::from(SEEKER));
    profile.personal_info = PersonalInfo {
        first_name: Some("Amina".to_string()),
        last_name: Some("Okafor".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1994, 6, 2),
        nationality: Some("NG".to_string()),
        phone: Some("+971500000000".to_string()),
    };
    profile.education.push(EducationEntry {
        institution: "University of Lagos".to_string(),
        qualification: "BSc Nursing".to_string(),
        completed_on: NaiveDate::from_ymd_opt(2016, 7, 1),
    });
    profile.experience.push(ExperienceEntry {
        title: "Staff Nurse".to_string(),
        employer: "Lagos General".to_string(),
        start_date: (now - Duration::days(365 * 2)).date_naive(),
        end_date: None,
    });
    profile.skills = vec!["Patient care".to_string(), "Triage".to_string()];
    store.insert_profile(profile)?;

    store.insert_job(Job {
        id: JobId::from(JOB),
        title: "ICU Nurse".to_string(),
        posted_by: UserId::from(SPONSOR),
        required_skills: vec!["Patient care".to_string(), "Ventilator management".to_string()],
        min_experience_years: Some(3),
    })?;
    store.insert_application(Application::submitted(
        APPLICATION,
        UserId::from(SEEKER),
        JobId::from(JOB),
        now - Duration::days(3),
    ))?;

    let uploads = [
        ("doc-passport", DocumentType::Passport, None),
        ("doc-bill", DocumentType::UtilityBill, None),
        ("doc-diploma", DocumentType::Diploma, None),
        ("doc-reference", DocumentType::ReferenceLetter, None),
        ("doc-visa", DocumentType::Visa, Some(Duration::days(10))),
        ("doc-permit", DocumentType::WorkPermit, Some(Duration::days(-1))),
    ];
    for (id, document_type, expires_in) in uploads {
        let mut document =
            Document::uploaded(id, UserId::from(SEEKER), document_type, now - Duration::days(5));
        document.profile_id = Some(ProfileId::from(PROFILE));
        document.expiry_date = expires_in.map(|offset| now + offset);
        store.insert_document(document)?;
    }
    Ok(())
}

fn run_scenario<S>(
    service: &VerificationService<S, InMemoryNotificationOutbox>,
    outbox: &InMemoryNotificationOutbox,
) -> Result<DemoOutcome, IntegrationError>
where
    S: WorkflowStore + 'static,
{
    let seeker = Actor::new(SEEKER, Role::JobSeeker);
    let agent = Actor::new("agent-1", Role::Agent);
    let admin = Actor::new("admin-1", Role::Admin);
    let profile_id = ProfileId::from(PROFILE);
    let job_id = JobId::from(JOB);
    let application_id = ApplicationId::from(APPLICATION);

    let eligibility_before = service.check_application_eligibility(&profile_id, &job_id, &agent)?;

    service.link_documents_to_application(
        &application_id,
        &[
            DocumentId::from("doc-passport"),
            DocumentId::from("doc-bill"),
            DocumentId::from("doc-diploma"),
        ],
        &seeker,
    )?;

    let verify = VerificationRequest::new(VerificationStatus::Verified, None);
    service.update_verification_status(&DocumentId::from("doc-passport"), verify.clone(), &agent)?;
    let kyc_after_identity = service.kyc_status(&UserId::from(SEEKER), &agent)?.kyc_status;

    service.update_verification_status(&DocumentId::from("doc-bill"), verify.clone(), &agent)?;
    let kyc_after_address = service.kyc_status(&UserId::from(SEEKER), &agent)?.kyc_status;

    let update =
        service.update_verification_status(&DocumentId::from("doc-diploma"), verify, &admin)?;
    let application = update
        .application
        .ok_or(NotFoundError::Application(application_id))?;

    let rejected = service.update_verification_status(
        &DocumentId::from("doc-reference"),
        VerificationRequest::new(VerificationStatus::Rejected, Some("signature missing")),
        &agent,
    )?;

    let eligibility_after = service.check_application_eligibility(&profile_id, &job_id, &agent)?;
    let sweep = service.check_document_expirations(None, &admin)?;
    let kyc_view = service.kyc_status(&UserId::from(SEEKER), &seeker)?;

    Ok(DemoOutcome {
        eligibility_before,
        kyc_after_identity,
        kyc_after_address,
        rejected_notes: rejected.document.notes,
        application,
        eligibility_after,
        sweep,
        kyc_view,
        notifications: outbox.drain(),
    })
}

fn render(today: NaiveDate, outcome: &DemoOutcome) {
    println!("ThiQaX verification demo");
    println!("Evaluation date: {}", today);

    println!("\nEligibility before verification");
    render_eligibility(&outcome.eligibility_before);

    println!("\nDocument review");
    println!(
        "  Passport verified -> KYC {}",
        outcome.kyc_after_identity.label()
    );
    println!(
        "  Utility bill verified -> KYC {}",
        outcome.kyc_after_address.label()
    );
    println!(
        "  Diploma verified -> application {} documents {}",
        outcome.application.id,
        outcome.application.document_status.label()
    );
    if outcome.application.document_status == DocumentStatus::Verified {
        println!(
            "  Linked documents: {}",
            outcome
                .application
                .document_ids
                .iter()
                .map(DocumentId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!(
        "  Reference letter rejected: {}",
        outcome.rejected_notes.as_deref().unwrap_or("no reason recorded")
    );

    println!("\nEligibility after verification");
    render_eligibility(&outcome.eligibility_after);

    println!("\nExpiry sweep");
    println!(
        "  Processed {} | reminders {} | expired {}",
        outcome.sweep.processed_count, outcome.sweep.notified_count, outcome.sweep.expired_count
    );

    println!("\nKYC summary");
    println!(
        "  Status: {} (verified: {})",
        outcome.kyc_view.kyc_status.label(),
        outcome.kyc_view.kyc_verified
    );
    if outcome.kyc_view.missing_documents.is_empty() {
        println!("  Missing documents: none");
    } else {
        println!(
            "  Missing documents: {}",
            outcome.kyc_view.missing_documents.join(", ")
        );
    }

    if outcome.notifications.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications");
        for notice in &outcome.notifications {
            println!("- {} <- {}: {}", notice.recipient, notice.title, notice.message);
        }
    }
}

fn render_eligibility(report: &EligibilityReport) {
    println!("  Eligible: {}", if report.eligible { "yes" } else { "no" });
    for reason in &report.reasons {
        println!("  - {}", reason);
    }
    for warning in &report.warnings {
        println!("  ! {}", warning);
    }
}
