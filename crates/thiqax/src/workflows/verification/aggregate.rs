use chrono::{DateTime, Utc};

use super::domain::{
    Actor, Application, ApplicationEvent, ApplicationHistoryEntry, Document, DocumentStatus,
    VerificationStatus,
};
use super::notices;
use super::outcome::Reconciled;

/// Any rejection wins; otherwise every linked document must be verified.
pub fn derive_document_status<'a, I>(documents: I) -> DocumentStatus
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut seen_any = false;
    let mut all_verified = true;

    for document in documents {
        seen_any = true;
        match document.status {
            VerificationStatus::Rejected => return DocumentStatus::Rejected,
            VerificationStatus::Verified => {}
            _ => all_verified = false,
        }
    }

    if seen_any && all_verified {
        DocumentStatus::Verified
    } else {
        DocumentStatus::Pending
    }
}

/// Re-derive an application's document status from the documents it links to.
///
/// Documents not listed in the application's set are ignored, as are ids with no matching
/// document (a deleted document only invalidates its link).
pub fn reconcile_application(
    application: &Application,
    documents: &[Document],
    actor: &Actor,
    now: DateTime<Utc>,
) -> Reconciled<Application> {
    let linked = documents
        .iter()
        .filter(|document| application.document_ids.contains(&document.id));
    let derived = derive_document_status(linked);

    if derived == application.document_status {
        return Reconciled::unchanged(application.clone());
    }

    let mut next = application.clone();
    next.document_status = derived;
    next.history.push(ApplicationHistoryEntry {
        event: ApplicationEvent::DocumentStatusChanged {
            document_status: derived,
        },
        actor: actor.id.clone(),
        timestamp: now,
        notes: Some(match derived {
            DocumentStatus::Verified => "all linked documents verified".to_string(),
            DocumentStatus::Rejected => "a linked document was rejected".to_string(),
            DocumentStatus::Pending => "awaiting document verification".to_string(),
        }),
    });

    let notification = notices::application_documents(&next);
    Reconciled::changed(next, vec![notification])
}
