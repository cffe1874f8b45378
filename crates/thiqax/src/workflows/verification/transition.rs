use chrono::{DateTime, Utc};

use super::domain::{Actor, Application, Document, DocumentHistoryEntry, VerificationStatus};
use super::errors::ValidationError;

/// Reviewer decision on a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub status: VerificationStatus,
    pub notes: Option<String>,
}

impl VerificationRequest {
    pub fn new(status: VerificationStatus, notes: Option<&str>) -> Self {
        Self {
            status,
            notes: notes.map(str::to_string),
        }
    }

    /// Build a request from the wire form. Rejections prefer the dedicated reason field.
    pub fn parse(
        status: &str,
        notes: Option<String>,
        rejection_reason: Option<String>,
    ) -> Result<Self, ValidationError> {
        let status: VerificationStatus = status.parse()?;
        let notes = if status == VerificationStatus::Rejected {
            non_blank(rejection_reason).or_else(|| non_blank(notes))
        } else {
            non_blank(notes).or_else(|| non_blank(rejection_reason))
        };
        Ok(Self { status, notes })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Apply a verification decision to a document snapshot.
pub fn apply_verification(
    document: &Document,
    request: &VerificationRequest,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Document, ValidationError> {
    let notes = non_blank(request.notes.clone());
    if request.status == VerificationStatus::Rejected && notes.is_none() {
        return Err(ValidationError::MissingRejectionNotes);
    }

    if document.is_removed() {
        return Err(ValidationError::DocumentRemoved(document.id.clone()));
    }

    if !document.status.can_transition_to(request.status) {
        return Err(ValidationError::InvalidTransition {
            from: document.status,
            to: request.status,
        });
    }

    let mut next = document.clone();
    next.status = request.status;
    next.notes = notes.clone();
    next.verified_by = match request.status {
        VerificationStatus::Verified | VerificationStatus::Rejected => Some(actor.id.clone()),
        _ => None,
    };
    next.verified_at = (request.status == VerificationStatus::Verified).then_some(now);
    next.history.push(DocumentHistoryEntry {
        status: request.status,
        notes,
        actor: actor.id.clone(),
        timestamp: now,
    });

    Ok(next)
}

/// Soft-remove a document the owner no longer wants on file.
pub fn soft_remove(
    document: &Document,
    referencing_application: Option<&Application>,
    now: DateTime<Utc>,
) -> Result<Document, ValidationError> {
    if document.is_removed() {
        return Err(ValidationError::DocumentRemoved(document.id.clone()));
    }

    if let Some(application) = referencing_application {
        if application.document_ids.contains(&document.id) {
            return Err(ValidationError::DocumentInUse {
                document: document.id.clone(),
                application: application.id.clone(),
            });
        }
    }

    let mut next = document.clone();
    next.removed_at = Some(now);
    Ok(next)
}
