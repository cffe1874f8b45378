use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use thiqax::workflows::verification::{
    Application, ApplicationId, ApplicationRepository, DirectoryRepository, Document, DocumentId,
    DocumentRepository, Job, JobId, Notification, NotificationDispatcher, NotificationError,
    Profile, ProfileId, ProfileRepository, RepositoryError, User, UserId,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Collections {
    documents: HashMap<DocumentId, Document>,
    profiles: HashMap<ProfileId, Profile>,
    applications: HashMap<ApplicationId, Application>,
    users: HashMap<UserId, User>,
    jobs: HashMap<JobId, Job>,
}

/// Process-local store used by the demo and by `serve` until a database adapter is wired in.
#[derive(Default, Clone)]
pub(crate) struct InMemoryWorkflowStore {
    collections: Arc<Mutex<Collections>>,
}

impl InMemoryWorkflowStore {
    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub(crate) fn insert_document(&self, document: Document) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.documents.contains_key(&document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.documents.insert(document.id.clone(), document);
        Ok(())
    }

    pub(crate) fn insert_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.profiles.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    pub(crate) fn insert_application(
        &self,
        application: Application,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    pub(crate) fn insert_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub(crate) fn insert_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.jobs.insert(job.id.clone(), job);
        Ok(())
    }
}

impl DocumentRepository for InMemoryWorkflowStore {
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(self.lock()?.documents.get(id).cloned())
    }

    fn update_document(&self, document: Document) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.documents.get_mut(&document.id) {
            Some(slot) => {
                *slot = document;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn documents_for_owner(&self, owner: &UserId) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.lock()?;
        let mut documents: Vec<Document> = guard
            .documents
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
        let guard = self.lock()?;
        let mut documents: Vec<Document> = guard
            .documents
            .values()
            .filter(|document| document.expiry_date.is_some_and(|at| at <= until))
            .cloned()
            .collect();
        documents.sort_by_key(|document| document.expiry_date);
        Ok(documents)
    }
}

impl ProfileRepository for InMemoryWorkflowStore {
    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.lock()?.profiles.get(id).cloned())
    }

    fn profile_for_user(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .lock()?
            .profiles
            .values()
            .find(|profile| &profile.user_id == user)
            .cloned())
    }

    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.profiles.get_mut(&profile.id) {
            Some(slot) => {
                *slot = profile;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

impl ApplicationRepository for InMemoryWorkflowStore {
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn applications_for_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.lock()?;
        let mut applications: Vec<Application> = guard
            .applications
            .values()
            .filter(|application| &application.applicant == applicant)
            .cloned()
            .collect();
        applications.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(applications)
    }
}

impl DirectoryRepository for InMemoryWorkflowStore {
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.lock()?.jobs.get(id).cloned())
    }
}

const OUTBOX_CAPACITY: usize = 256;

/// Logs every dispatched notification and keeps the most recent ones for inspection.
#[derive(Clone)]
pub(crate) struct InMemoryNotificationOutbox {
    capacity: usize,
    recent: Arc<Mutex<VecDeque<Notification>>>,
}

impl Default for InMemoryNotificationOutbox {
    fn default() -> Self {
        Self::with_capacity(OUTBOX_CAPACITY)
    }
}

impl NotificationDispatcher for InMemoryNotificationOutbox {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            title = %notification.title,
            "notification queued"
        );
        let mut guard = self
            .recent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox mutex poisoned".to_string()))?;
        if guard.len() == self.capacity {
            guard.pop_front();
        }
        if self.capacity > 0 {
            guard.push_back(notification);
        }
        Ok(())
    }
}

impl InMemoryNotificationOutbox {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub(crate) fn drain(&self) -> Vec<Notification> {
        match self.recent.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiqax::workflows::verification::{DocumentType, Role};

    #[test]
    fn inserts_refuse_duplicates_and_updates_need_a_record() {
        let store = InMemoryWorkflowStore::default();
        let at = Utc::now();
        let document = Document::uploaded("doc-1", UserId::from("u-1"), DocumentType::Visa, at);

        store.insert_document(document.clone()).expect("first insert");
        assert!(matches!(
            store.insert_document(document.clone()),
            Err(RepositoryError::Conflict)
        ));

        let stray = Document::uploaded("doc-2", UserId::from("u-1"), DocumentType::Visa, at);
        assert!(matches!(
            store.update_document(stray),
            Err(RepositoryError::NotFound)
        ));

        store
            .insert_user(User {
                id: UserId::from("u-1"),
                role: Role::JobSeeker,
                name: "Grace".to_string(),
                email: "grace@example.test".to_string(),
                kyc_verified: None,
            })
            .expect("user insert");
        assert!(store
            .fetch_user(&UserId::from("u-1"))
            .expect("fetch")
            .is_some());
    }

    #[test]
    fn expiring_documents_come_back_soonest_first() {
        let store = InMemoryWorkflowStore::default();
        let now = Utc::now();
        for (id, days) in [("late", 20), ("early", 2), ("none", 0)] {
            let mut document =
                Document::uploaded(id, UserId::from("u-1"), DocumentType::WorkPermit, now);
            if days > 0 {
                document.expiry_date = Some(now + chrono::Duration::days(days));
            }
            store.insert_document(document).expect("insert");
        }

        let ids: Vec<String> = store
            .documents_expiring_before(now + chrono::Duration::days(30))
            .expect("query")
            .into_iter()
            .map(|document| document.id.0)
            .collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
    }

    #[test]
    fn outbox_drains_in_dispatch_order() {
        let outbox = InMemoryNotificationOutbox::default();
        for recipient in ["u-1", "u-2"] {
            outbox
                .dispatch(Notification {
                    recipient: UserId::from(recipient),
                    kind: thiqax::workflows::verification::NotificationKind::KycUpdated,
                    title: "KYC status updated".to_string(),
                    message: "pending".to_string(),
                    reference: None,
                })
                .expect("dispatch");
        }

        let drained = outbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].recipient, UserId::from("u-1"));
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn outbox_keeps_only_the_newest_notifications() {
        let outbox = InMemoryNotificationOutbox::with_capacity(3);
        for index in 0..10 {
            outbox
                .dispatch(Notification {
                    recipient: UserId::from(format!("u-{index}").as_str()),
                    kind: thiqax::workflows::verification::NotificationKind::DocumentExpiring,
                    title: "Document expiring soon".to_string(),
                    message: "renew".to_string(),
                    reference: None,
                })
                .expect("dispatch");
        }

        let recipients: Vec<String> = outbox
            .drain()
            .into_iter()
            .map(|notice| notice.recipient.0)
            .collect();
        assert_eq!(recipients, vec!["u-7", "u-8", "u-9"]);
    }
}
