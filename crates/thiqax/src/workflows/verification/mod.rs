//! Document verification and KYC reconciliation.
//!
//! Every rule lives in a pure function that takes record snapshots and returns the next
//! state plus the notifications it implies. `VerificationService` loads the snapshots,
//! applies the rules, persists the results, and dispatches notifications.

pub(crate) mod access;
pub mod aggregate;
pub mod completeness;
pub mod domain;
pub mod eligibility;
pub mod errors;
pub mod expiry;
pub mod kyc;
pub mod lifecycle;
pub mod linking;
pub(crate) mod notices;
pub mod outcome;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, Application, ApplicationEvent, ApplicationHistoryEntry, ApplicationId,
    ApplicationStatus, Completeness, Document, DocumentCategory, DocumentHistoryEntry,
    DocumentId, DocumentStatus, DocumentType, EducationEntry, ExperienceEntry, Job, JobId,
    KycStatus, PersonalInfo, Profile, ProfileId, Role, UnknownVariant, User, UserId,
    VerificationBreakdown, VerificationStatus,
};
pub use eligibility::{evaluate_eligibility, EligibilityReport};
pub use errors::{IntegrationError, NotFoundError, ValidationError};
pub use expiry::{plan_expirations, ExpiryPlan, ExpirySweepSummary};
pub use kyc::{assess_kyc, KycAssessment};
pub use outcome::Reconciled;
pub use repository::{
    ApplicationRepository, DirectoryRepository, DocumentRepository, Notification,
    NotificationDispatcher, NotificationError, NotificationKind, ProfileRepository,
    RepositoryError, WorkflowStore,
};
pub use router::integration_router;
pub use service::{
    Clock, KycStatusView, ReconcileReport, ReconcileTarget, SystemClock, VerificationService,
    VerificationUpdate,
};
pub use transition::VerificationRequest;
