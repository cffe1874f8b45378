use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Document, DocumentCategory, KycStatus, Profile, VerificationBreakdown};
use super::notices;
use super::outcome::Reconciled;

pub const PROOF_OF_IDENTITY: &str = "Proof of Identity";
pub const PROOF_OF_ADDRESS: &str = "Proof of Address";

/// KYC state derived from the verified documents a user currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycAssessment {
    pub status: KycStatus,
    pub breakdown: VerificationBreakdown,
    pub missing_documents: Vec<String>,
}

impl KycAssessment {
    pub fn has_valid_kyc(&self) -> bool {
        self.status == KycStatus::Verified
    }
}

/// Identity and address each need one verified document; education and professional
/// documents are tallied for reporting only.
pub fn assess_kyc<'a, I>(documents: I) -> KycAssessment
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut breakdown = VerificationBreakdown::default();
    for document in documents {
        if !document.counts_as_verified() {
            continue;
        }
        if let Some(category) = document.category() {
            breakdown.bucket_mut(category).push(document.id.clone());
        }
    }

    for category in [
        DocumentCategory::Identity,
        DocumentCategory::Address,
        DocumentCategory::Education,
        DocumentCategory::Professional,
    ] {
        let bucket = breakdown.bucket_mut(category);
        bucket.sort();
        bucket.dedup();
    }

    let identity = !breakdown.identity.is_empty();
    let address = !breakdown.address.is_empty();

    let status = match (identity, address) {
        (true, true) => KycStatus::Verified,
        (true, false) => KycStatus::Partial,
        _ => KycStatus::Pending,
    };

    let mut missing_documents = Vec::new();
    if !identity {
        missing_documents.push(PROOF_OF_IDENTITY.to_string());
    }
    if !address {
        missing_documents.push(PROOF_OF_ADDRESS.to_string());
    }

    KycAssessment {
        status,
        breakdown,
        missing_documents,
    }
}

/// Recompute a profile's KYC fields from the owner's documents.
///
/// Documents belonging to anyone else are ignored. The timestamp only moves when something
/// actually changed, and only a status change produces a notification.
pub fn reconcile_kyc(
    profile: &Profile,
    documents: &[Document],
    now: DateTime<Utc>,
) -> Reconciled<Profile> {
    let assessment = assess_kyc(
        documents
            .iter()
            .filter(|document| document.owner == profile.user_id),
    );

    let unchanged = assessment.status == profile.kyc_status
        && assessment.breakdown == profile.verification
        && assessment.missing_documents == profile.missing_documents;
    if unchanged {
        return Reconciled::unchanged(profile.clone());
    }

    let previous = profile.kyc_status;
    let mut next = profile.clone();
    next.kyc_status = assessment.status;
    next.verification = assessment.breakdown;
    next.missing_documents = assessment.missing_documents;
    next.last_kyc_update = Some(now);

    let notifications = if previous != next.kyc_status {
        vec![notices::kyc_changed(
            &next.user_id,
            previous,
            next.kyc_status,
            &next.missing_documents,
        )]
    } else {
        Vec::new()
    };

    Reconciled {
        record: next,
        changed: true,
        notifications,
    }
}
