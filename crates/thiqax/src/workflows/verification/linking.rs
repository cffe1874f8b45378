use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::domain::{
    Actor, Application, ApplicationEvent, ApplicationHistoryEntry, Document, DocumentId,
};
use super::errors::{IntegrationError, NotFoundError, ValidationError};

/// Validated result of attaching documents to an application, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPlan {
    pub application: Application,
    /// Requested documents with their application reference pointed at the target.
    pub documents: Vec<Document>,
    /// Ids that were not already part of the application's set.
    pub added: Vec<DocumentId>,
}

/// Merge `requested` into the application's document set.
///
/// Every check runs before anything is built, so a failure leaves no partial merge behind.
pub fn plan_link(
    application: &Application,
    requested: &[DocumentId],
    found: Vec<Document>,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<LinkPlan, IntegrationError> {
    let requested: BTreeSet<&DocumentId> = requested.iter().collect();
    if requested.is_empty() {
        return Err(ValidationError::EmptyDocumentIds.into());
    }

    let missing: Vec<DocumentId> = requested
        .iter()
        .filter(|id| !found.iter().any(|document| &&document.id == *id))
        .map(|id| (*id).clone())
        .collect();
    if !missing.is_empty() {
        return Err(NotFoundError::Documents(missing).into());
    }

    if found
        .iter()
        .any(|document| document.owner != application.applicant)
    {
        return Err(IntegrationError::forbidden(
            "documents do not belong to the applicant",
        ));
    }

    if let Some(removed) = found.iter().find(|document| document.is_removed()) {
        return Err(ValidationError::DocumentRemoved(removed.id.clone()).into());
    }

    // A document belongs to at most one application.
    if let Some((document, other)) = found.iter().find_map(|document| {
        document
            .application_id
            .as_ref()
            .filter(|other| *other != &application.id)
            .map(|other| (document, other))
    }) {
        return Err(ValidationError::DocumentLinkedElsewhere {
            document: document.id.clone(),
            application: other.clone(),
        }
        .into());
    }

    let mut next = application.clone();
    let mut added = Vec::new();
    let mut documents = Vec::new();
    for document in found
        .into_iter()
        .filter(|document| requested.contains(&document.id))
    {
        if next.document_ids.insert(document.id.clone()) {
            added.push(document.id.clone());
        }
        let mut linked = document;
        linked.application_id = Some(next.id.clone());
        documents.push(linked);
    }

    next.history.push(ApplicationHistoryEntry {
        event: ApplicationEvent::DocumentsAdded {
            document_ids: requested.iter().map(|id| (*id).clone()).collect(),
        },
        actor: actor.id.clone(),
        timestamp: now,
        notes: Some(format!("{} new document(s) linked", added.len())),
    });

    Ok(LinkPlan {
        application: next,
        documents,
        added,
    })
}
