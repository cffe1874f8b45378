use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, Document, DocumentId, Job, JobId, Profile, ProfileId, User,
    UserId,
};

/// Storage for uploaded documents.
pub trait DocumentRepository: Send + Sync {
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;
    fn update_document(&self, document: Document) -> Result<(), RepositoryError>;
    fn documents_for_owner(&self, owner: &UserId) -> Result<Vec<Document>, RepositoryError>;
    /// Documents carrying an expiry date on or before `until`.
    fn documents_expiring_before(
        &self,
        until: DateTime<Utc>,
    ) -> Result<Vec<Document>, RepositoryError>;
}

/// Storage for job seeker profiles.
pub trait ProfileRepository: Send + Sync {
    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError>;
    fn profile_for_user(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError>;
    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError>;
}

/// Storage for job applications.
pub trait ApplicationRepository: Send + Sync {
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn applications_for_applicant(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<Application>, RepositoryError>;
}

/// Read access to accounts and job postings, plus the user-level KYC mirror.
pub trait DirectoryRepository: Send + Sync {
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
}

/// Every collection the verification workflow touches.
pub trait WorkflowStore:
    DocumentRepository + ProfileRepository + ApplicationRepository + DirectoryRepository
{
}

impl<T> WorkflowStore for T where
    T: DocumentRepository + ProfileRepository + ApplicationRepository + DirectoryRepository
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (in-app inbox, e-mail, Slack adapters).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    DocumentVerified,
    DocumentRejected,
    DocumentStatusChanged,
    DocumentExpiring,
    DocumentExpired,
    DocumentsLinked,
    ApplicationDocumentsUpdated,
    ApplicationStatusChanged,
    KycVerified,
    KycDowngraded,
    KycUpdated,
}

/// What the workflow wants delivered and to whom; delivery itself is the dispatcher's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub reference: Option<String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
