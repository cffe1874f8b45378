use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Document;

/// Documents selected by one run of the expiry sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpiryPlan {
    /// Expiring inside the look-ahead window and not yet reminded.
    pub reminders: Vec<Document>,
    /// Past their expiry date and not yet marked expired.
    pub expirations: Vec<Document>,
}

impl ExpiryPlan {
    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty() && self.expirations.is_empty()
    }
}

/// Counters reported by the sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirySweepSummary {
    pub processed_count: usize,
    pub notified_count: usize,
    pub expired_count: usize,
}

/// Split candidate documents into reminder and expiration passes.
///
/// Removed documents are skipped, as are rejected ones since they cannot change state.
pub fn plan_expirations(
    documents: Vec<Document>,
    now: DateTime<Utc>,
    window: Duration,
) -> ExpiryPlan {
    let horizon = now + window;
    let mut plan = ExpiryPlan::default();

    for document in documents {
        let Some(expires_at) = document.expiry_date else {
            continue;
        };
        // Rejected and expired are terminal: `can_transition_to` has no edge out of either,
        // so a rejected document keeps its rejection instead of becoming expired.
        if document.is_removed() || document.status.is_terminal() {
            continue;
        }

        if expires_at < now {
            plan.expirations.push(document);
        } else if expires_at <= horizon && !document.expiry_notified {
            plan.reminders.push(document);
        }
    }

    plan
}

pub(crate) fn mark_reminded(document: &Document) -> Document {
    let mut next = document.clone();
    next.expiry_notified = true;
    next
}

pub(crate) fn expiry_note(document: &Document) -> String {
    match document.expiry_date {
        Some(expires_at) => format!("Document expired on {}", expires_at.date_naive()),
        None => "Document expired".to_string(),
    }
}
