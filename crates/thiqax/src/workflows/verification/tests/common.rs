use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::verification::domain::{
    Actor, Application, ApplicationId, Document, DocumentId, DocumentType, EducationEntry,
    ExperienceEntry, Job, JobId, PersonalInfo, Profile, ProfileId, Role, User, UserId,
    VerificationStatus,
};
use crate::workflows::verification::repository::{
    ApplicationRepository, DirectoryRepository, DocumentRepository, Notification,
    NotificationDispatcher, NotificationError, NotificationKind, ProfileRepository,
    RepositoryError,
};
use crate::workflows::verification::service::{Clock, VerificationService};

pub(super) const APPLICANT: &str = "u-1";
pub(super) const OTHER_SEEKER: &str = "u-2";
pub(super) const SPONSOR: &str = "sponsor-1";
pub(super) const PROFILE: &str = "profile-1";
pub(super) const JOB: &str = "job-1";
pub(super) const APPLICATION: &str = "app-1";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

pub(super) fn agent() -> Actor {
    Actor::new("agent-1", Role::Agent)
}

pub(super) fn applicant() -> Actor {
    Actor::new(APPLICANT, Role::JobSeeker)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    documents: Mutex<HashMap<DocumentId, Document>>,
    profiles: Mutex<HashMap<ProfileId, Profile>>,
    applications: Mutex<HashMap<ApplicationId, Application>>,
    users: Mutex<HashMap<UserId, User>>,
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl MemoryStore {
    pub(super) fn put_document(&self, document: Document) {
        self.documents
            .lock()
            .expect("document mutex poisoned")
            .insert(document.id.clone(), document);
    }

    pub(super) fn put_profile(&self, profile: Profile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.clone(), profile);
    }

    pub(super) fn put_application(&self, application: Application) {
        self.applications
            .lock()
            .expect("application mutex poisoned")
            .insert(application.id.clone(), application);
    }

    pub(super) fn put_user(&self, user: User) {
        self.users
            .lock()
            .expect("user mutex poisoned")
            .insert(user.id.clone(), user);
    }

    pub(super) fn put_job(&self, job: Job) {
        self.jobs
            .lock()
            .expect("job mutex poisoned")
            .insert(job.id.clone(), job);
    }

    pub(super) fn document(&self, id: &str) -> Document {
        self.fetch_document(&DocumentId::from(id))
            .expect("fetch succeeds")
            .expect("document present")
    }

    pub(super) fn application(&self, id: &str) -> Application {
        self.fetch_application(&ApplicationId::from(id))
            .expect("fetch succeeds")
            .expect("application present")
    }

    pub(super) fn profile(&self, id: &str) -> Profile {
        self.fetch_profile(&ProfileId::from(id))
            .expect("fetch succeeds")
            .expect("profile present")
    }

    pub(super) fn user(&self, id: &str) -> User {
        self.fetch_user(&UserId::from(id))
            .expect("fetch succeeds")
            .expect("user present")
    }
}

impl DocumentRepository for MemoryStore {
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_document(&self, document: Document) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("document mutex poisoned");
        match guard.get_mut(&document.id) {
            Some(slot) => {
                *slot = document;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn documents_for_owner(&self, owner: &UserId) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|document| &document.owner == owner)
            .cloned()
            .collect();
        documents.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(documents)
    }

    fn documents_expiring_before(
        &self,
        until: DateTime<Utc>,
    ) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("document mutex poisoned");
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|document| document.expiry_date.is_some_and(|at| at <= until))
            .cloned()
            .collect();
        documents.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(documents)
    }
}

impl ProfileRepository for MemoryStore {
    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn profile_for_user(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard
            .values()
            .find(|profile| &profile.user_id == user)
            .cloned())
    }

    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        self.put_profile(profile);
        Ok(())
    }
}

impl ApplicationRepository for MemoryStore {
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("application mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        self.put_application(application);
        Ok(())
    }

    fn applications_for_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("application mutex poisoned");
        let mut applications: Vec<Application> = guard
            .values()
            .filter(|application| &application.applicant == applicant)
            .cloned()
            .collect();
        applications.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(applications)
    }
}

impl DirectoryRepository for MemoryStore {
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.lock().expect("user mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        self.put_user(user);
        Ok(())
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Store whose every call fails, for exercising the HTTP 500 path.
pub(super) struct UnavailableStore;

impl DocumentRepository for UnavailableStore {
    fn fetch_document(&self, _id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_document(&self, _document: Document) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn documents_for_owner(&self, _owner: &UserId) -> Result<Vec<Document>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn documents_expiring_before(
        &self,
        _until: DateTime<Utc>,
    ) -> Result<Vec<Document>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ProfileRepository for UnavailableStore {
    fn fetch_profile(&self, _id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn profile_for_user(&self, _user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_profile(&self, _profile: Profile) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ApplicationRepository for UnavailableStore {
    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn applications_for_applicant(
        &self,
        _applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl DirectoryRepository for UnavailableStore {
    fn fetch_user(&self, _id: &UserId) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_user(&self, _user: User) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn kinds(&self) -> Vec<NotificationKind> {
        self.sent().into_iter().map(|notice| notice.kind).collect()
    }

    pub(super) fn clear(&self) {
        self.sent.lock().expect("notifier mutex poisoned").clear();
    }
}

impl NotificationDispatcher for MemoryNotifier {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationDispatcher for FailingNotifier {
    fn dispatch(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

/// Clock pinned to an instant that tests can move forward.
pub(super) struct FixedClock {
    at: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn new(at: DateTime<Utc>) -> Self {
        Self { at: Mutex::new(at) }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.at.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock().expect("clock mutex poisoned")
    }
}

pub(super) struct Harness<N = MemoryNotifier> {
    pub service: VerificationService<MemoryStore, N>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<N>,
    pub clock: Arc<FixedClock>,
}

pub(super) fn harness() -> Harness {
    harness_with(Arc::new(MemoryNotifier::default()))
}

pub(super) fn harness_with<N>(notifier: Arc<N>) -> Harness<N>
where
    N: NotificationDispatcher + 'static,
{
    let store = Arc::new(MemoryStore::default());
    seed(&store);
    let clock = Arc::new(FixedClock::new(now()));
    let service = VerificationService::with_clock(
        store.clone(),
        notifier.clone(),
        WorkflowConfig::default(),
        clock.clone(),
    );

    Harness {
        service,
        store,
        notifier,
        clock,
    }
}

fn user(id: &str, role: Role, kyc_verified: Option<bool>) -> User {
    User {
        id: UserId::from(id),
        role,
        name: format!("User {id}"),
        email: format!("{id}@thiqax.test"),
        kyc_verified,
    }
}

pub(super) fn complete_profile(id: &str, owner: &str) -> Profile {
    let mut profile = Profile::new(id, UserId::from(owner));
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
        start_date: NaiveDate::from_ymd_opt(2019, 1, 1).expect("valid date"),
        end_date: None,
    });
    profile.skills = vec!["Patient care".to_string(), "Triage".to_string()];
    profile
}

fn seed(store: &MemoryStore) {
    store.put_user(user(APPLICANT, Role::JobSeeker, Some(false)));
    store.put_user(user(OTHER_SEEKER, Role::JobSeeker, None));
    store.put_user(user(SPONSOR, Role::Sponsor, None));
    store.put_user(user("admin-1", Role::Admin, None));
    store.put_user(user("agent-1", Role::Agent, None));

    store.put_profile(complete_profile(PROFILE, APPLICANT));
    store.put_profile(Profile::new("profile-2", UserId::from(OTHER_SEEKER)));

    store.put_job(Job {
        id: JobId::from(JOB),
        title: "ICU Nurse".to_string(),
        posted_by: UserId::from(SPONSOR),
        required_skills: vec!["Patient care".to_string(), "Ventilator management".to_string()],
        min_experience_years: Some(2),
    });

    store.put_application(Application::submitted(
        APPLICATION,
        UserId::from(APPLICANT),
        JobId::from(JOB),
        now() - Duration::days(3),
    ));
}

/// Upload a document for `owner` and return its id.
pub(super) fn upload(
    store: &MemoryStore,
    id: &str,
    owner: &str,
    document_type: DocumentType,
) -> DocumentId {
    let document = Document::uploaded(
        id,
        UserId::from(owner),
        document_type,
        now() - Duration::days(1),
    );
    let document_id = document.id.clone();
    store.put_document(document);
    document_id
}

/// Upload a document that is already verified.
pub(super) fn upload_verified(
    store: &MemoryStore,
    id: &str,
    owner: &str,
    document_type: DocumentType,
) -> DocumentId {
    let document_id = upload(store, id, owner, document_type);
    let mut document = store.document(id);
    document.status = VerificationStatus::Verified;
    document.verified_by = Some(UserId::from("admin-1"));
    document.verified_at = Some(now() - Duration::hours(12));
    store.put_document(document);
    document_id
}

pub(super) fn with_expiry(store: &MemoryStore, id: &str, expires_in: Duration) {
    let mut document = store.document(id);
    document.expiry_date = Some(now() + expires_in);
    store.put_document(document);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
