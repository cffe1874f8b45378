//! Message templates for the notifications the workflow emits.

use chrono::{DateTime, Utc};

use super::domain::{
    Application, Document, DocumentCategory, DocumentStatus, Job, KycStatus, UserId,
    VerificationStatus,
};
use super::repository::{Notification, NotificationKind};

/// Owner-facing notice for a verification transition, worded per document category.
pub(crate) fn document_status(document: &Document) -> Notification {
    let label = document.document_type.label();
    let (kind, title) = match document.status {
        VerificationStatus::Verified => (NotificationKind::DocumentVerified, "Document verified"),
        VerificationStatus::Rejected => (NotificationKind::DocumentRejected, "Document rejected"),
        VerificationStatus::Expired => (NotificationKind::DocumentExpired, "Document expired"),
        VerificationStatus::Pending | VerificationStatus::UnderReview => (
            NotificationKind::DocumentStatusChanged,
            "Document status updated",
        ),
    };

    let message = match (document.status, document.category()) {
        (VerificationStatus::Verified, Some(DocumentCategory::Identity)) => format!(
            "Your {label} has been verified. Your identity check is complete."
        ),
        (VerificationStatus::Verified, Some(DocumentCategory::Address)) => format!(
            "Your {label} has been verified and now counts as proof of address."
        ),
        (VerificationStatus::Verified, Some(DocumentCategory::Education)) => format!(
            "Your {label} has been verified and will be shown to employers as a confirmed qualification."
        ),
        (VerificationStatus::Verified, Some(DocumentCategory::Professional)) => format!(
            "Your {label} has been verified and added to your professional record."
        ),
        (VerificationStatus::Verified, None) => format!("Your {label} has been verified."),
        (VerificationStatus::Rejected, _) => format!(
            "Your {label} was rejected: {}. Please upload a new copy.",
            document.notes.as_deref().unwrap_or("no reason given")
        ),
        (VerificationStatus::Expired, Some(DocumentCategory::Identity | DocumentCategory::Address)) => {
            format!(
                "Your {label} has expired. Upload a current copy to keep your KYC verification active."
            )
        }
        (VerificationStatus::Expired, _) => {
            format!("Your {label} has expired. Upload a current copy.")
        }
        (VerificationStatus::UnderReview, _) => {
            format!("Your {label} is now under review.")
        }
        (VerificationStatus::Pending, _) => {
            format!("Your {label} is awaiting review.")
        }
    };

    Notification {
        recipient: document.owner.clone(),
        kind,
        title: title.to_string(),
        message,
        reference: Some(document.id.to_string()),
    }
}

pub(crate) fn application_documents(application: &Application) -> Notification {
    let message = match application.document_status {
        DocumentStatus::Verified => {
            "All documents attached to your application have been verified.".to_string()
        }
        DocumentStatus::Rejected => {
            "A document attached to your application was rejected. Review it and upload a replacement."
                .to_string()
        }
        DocumentStatus::Pending => {
            "Documents attached to your application are awaiting verification.".to_string()
        }
    };

    Notification {
        recipient: application.applicant.clone(),
        kind: NotificationKind::ApplicationDocumentsUpdated,
        title: "Application documents updated".to_string(),
        message,
        reference: Some(application.id.to_string()),
    }
}

pub(crate) fn documents_linked(
    application: &Application,
    recipient: &UserId,
    added: usize,
    job: Option<&Job>,
) -> Notification {
    let target = job
        .map(|job| format!("the application for {}", job.title))
        .unwrap_or_else(|| format!("application {}", application.id));
    let message = if recipient == &application.applicant {
        format!("{added} document(s) were added to {target}.")
    } else {
        format!(
            "{added} document(s) were added to {target} by the applicant's representative."
        )
    };

    Notification {
        recipient: recipient.clone(),
        kind: NotificationKind::DocumentsLinked,
        title: "Documents added to application".to_string(),
        message,
        reference: Some(application.id.to_string()),
    }
}

pub(crate) fn application_status(application: &Application, recipient: &UserId) -> Notification {
    Notification {
        recipient: recipient.clone(),
        kind: NotificationKind::ApplicationStatusChanged,
        title: "Application status updated".to_string(),
        message: format!(
            "Application {} is now {}.",
            application.id,
            application.status.label()
        ),
        reference: Some(application.id.to_string()),
    }
}

pub(crate) fn kyc_changed(
    user: &UserId,
    previous: KycStatus,
    current: KycStatus,
    missing_documents: &[String],
) -> Notification {
    let (kind, title, message) = match (previous, current) {
        (previous, KycStatus::Verified) if previous != KycStatus::Verified => (
            NotificationKind::KycVerified,
            "KYC verification complete",
            "Your identity and address have been verified. You can now apply for jobs.".to_string(),
        ),
        (KycStatus::Verified, current) => (
            NotificationKind::KycDowngraded,
            "KYC verification no longer complete",
            format!(
                "Your KYC status changed to {}. Missing: {}.",
                current.label(),
                missing_or_none(missing_documents)
            ),
        ),
        (_, current) => (
            NotificationKind::KycUpdated,
            "KYC status updated",
            format!(
                "Your KYC status is now {}. Still required: {}.",
                current.label(),
                missing_or_none(missing_documents)
            ),
        ),
    };

    Notification {
        recipient: user.clone(),
        kind,
        title: title.to_string(),
        message,
        reference: None,
    }
}

pub(crate) fn document_expiring(
    document: &Document,
    recipient: &UserId,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Notification {
    let days_left = (expires_at - now).num_days();
    let message = if recipient == &document.owner {
        format!(
            "Your {} expires on {} ({days_left} day(s) left). Upload a renewed copy before then.",
            document.document_type.label(),
            expires_at.date_naive()
        )
    } else {
        format!(
            "A {} attached to one of your applications expires on {}.",
            document.document_type.label(),
            expires_at.date_naive()
        )
    };

    Notification {
        recipient: recipient.clone(),
        kind: NotificationKind::DocumentExpiring,
        title: "Document expiring soon".to_string(),
        message,
        reference: Some(document.id.to_string()),
    }
}

fn missing_or_none(missing: &[String]) -> String {
    if missing.is_empty() {
        "nothing".to_string()
    } else {
        missing.join(", ")
    }
}
