use super::domain::{
    ApplicationId, DocumentId, JobId, ProfileId, UnknownVariant, UserId, VerificationStatus,
};
use super::repository::RepositoryError;

/// Malformed or disallowed input; surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("verification notes are required when rejecting a document")]
    MissingRejectionNotes,
    #[error("documentIds must contain at least one document id")]
    EmptyDocumentIds,
    #[error(transparent)]
    UnknownValue(#[from] UnknownVariant),
    #[error("document cannot move from {from} to {to}")]
    InvalidTransition {
        from: VerificationStatus,
        to: VerificationStatus,
    },
    #[error("document {0} has been removed")]
    DocumentRemoved(DocumentId),
    #[error("document {document} is still referenced by application {application}")]
    DocumentInUse {
        document: DocumentId,
        application: ApplicationId,
    },
    #[error("document {document} is already linked to application {application}")]
    DocumentLinkedElsewhere {
        document: DocumentId,
        application: ApplicationId,
    },
    #[error("application {application} is {status} and cannot be reopened")]
    ApplicationClosed {
        application: ApplicationId,
        status: &'static str,
    },
    #[error("application {application} is already {status}")]
    ApplicationUnchanged {
        application: ApplicationId,
        status: &'static str,
    },
    #[error("application cannot return to submitted")]
    ApplicationResubmission,
    #[error("expiry window must not be a negative number of days (found {0})")]
    InvalidExpiryWindow(i64),
}

/// A referenced record does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("document {0} not found")]
    Document(DocumentId),
    #[error("documents not found: {}", join_ids(.0))]
    Documents(Vec<DocumentId>),
    #[error("application {0} not found")]
    Application(ApplicationId),
    #[error("profile {0} not found")]
    Profile(ProfileId),
    #[error("no profile found for user {0}")]
    ProfileForUser(UserId),
    #[error("job {0} not found")]
    Job(JobId),
    #[error("user {0} not found")]
    User(UserId),
}

fn join_ids(ids: &[DocumentId]) -> String {
    ids.iter()
        .map(DocumentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IntegrationError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }
}

impl From<UnknownVariant> for IntegrationError {
    fn from(value: UnknownVariant) -> Self {
        Self::Validation(ValidationError::UnknownValue(value))
    }
}
