use super::common::*;
use std::sync::Arc;

use crate::workflows::verification::domain::{
    Actor, ApplicationId, ApplicationStatus, DocumentType, JobId, KycStatus, ProfileId, Role,
    UserId, VerificationStatus,
};
use crate::workflows::verification::errors::{IntegrationError, NotFoundError, ValidationError};
use crate::workflows::verification::kyc::PROOF_OF_ADDRESS;
use crate::workflows::verification::repository::NotificationKind;
use crate::workflows::verification::transition::VerificationRequest;

fn verify() -> VerificationRequest {
    VerificationRequest::new(VerificationStatus::Verified, None)
}

#[test]
fn verifying_a_passport_leaves_kyc_partial() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);

    let update = h
        .service
        .update_verification_status(&passport, verify(), &admin())
        .expect("admin may verify");
    assert_eq!(update.document.status, VerificationStatus::Verified);
    assert_eq!(update.document.verified_at, Some(now()));
    assert_eq!(update.document.verified_by, Some(UserId::from("admin-1")));
    assert!(update.application.is_none());

    let profile = h
        .service
        .sync_profile_verification_status(&UserId::from(APPLICANT), &admin())
        .expect("profile resolves");
    assert_eq!(profile.kyc_status, KycStatus::Partial);
    assert!(profile
        .missing_documents
        .contains(&PROOF_OF_ADDRESS.to_string()));
    assert_eq!(h.store.profile(PROFILE).kyc_status, KycStatus::Partial);

    assert_eq!(
        h.notifier.kinds(),
        vec![NotificationKind::KycUpdated, NotificationKind::DocumentVerified]
    );
}

#[test]
fn kyc_sync_is_idempotent() {
    let h = harness();
    upload_verified(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    upload_verified(&h.store, "doc-bill", APPLICANT, DocumentType::UtilityBill);
    let user = UserId::from(APPLICANT);

    let first = h
        .service
        .sync_profile_verification_status(&user, &agent())
        .expect("first sync");
    assert_eq!(first.kyc_status, KycStatus::Verified);
    assert_eq!(first.last_kyc_update, Some(now()));
    let sent_after_first = h.notifier.sent().len();
    assert_eq!(sent_after_first, 1);

    h.clock.advance(chrono::Duration::hours(2));
    let second = h
        .service
        .sync_profile_verification_status(&user, &agent())
        .expect("second sync");
    assert_eq!(second, first);
    assert_eq!(h.store.profile(PROFILE), first);
    assert_eq!(h.notifier.sent().len(), sent_after_first);
}

#[test]
fn kyc_verification_is_mirrored_onto_the_account() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    let bill = upload(&h.store, "doc-bill", APPLICANT, DocumentType::UtilityBill);

    h.service
        .update_verification_status(&passport, verify(), &agent())
        .expect("verify passport");
    assert_eq!(h.store.user(APPLICANT).kyc_verified, Some(false));

    h.service
        .update_verification_status(&bill, verify(), &agent())
        .expect("verify bill");
    assert_eq!(h.store.profile(PROFILE).kyc_status, KycStatus::Verified);
    assert_eq!(h.store.user(APPLICANT).kyc_verified, Some(true));
    assert!(h.notifier.kinds().contains(&NotificationKind::KycVerified));
}

#[test]
fn expiring_an_address_document_downgrades_kyc() {
    let h = harness();
    upload_verified(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    let bill = upload_verified(&h.store, "doc-bill", APPLICANT, DocumentType::BankStatement);
    h.service
        .sync_profile_verification_status(&UserId::from(APPLICANT), &admin())
        .expect("initial sync");

    h.service
        .update_verification_status(
            &bill,
            VerificationRequest::new(VerificationStatus::Expired, Some("statement is stale")),
            &admin(),
        )
        .expect("verified documents may expire");

    let profile = h.store.profile(PROFILE);
    assert_eq!(profile.kyc_status, KycStatus::Partial);
    assert_eq!(profile.missing_documents, vec![PROOF_OF_ADDRESS.to_string()]);
    assert_eq!(h.store.user(APPLICANT).kyc_verified, Some(false));
    assert!(h.notifier.kinds().contains(&NotificationKind::KycDowngraded));
}

#[test]
fn rejection_requires_notes() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);

    for notes in [None, Some(""), Some("   ")] {
        let result = h.service.update_verification_status(
            &passport,
            VerificationRequest::new(VerificationStatus::Rejected, notes),
            &admin(),
        );
        assert!(matches!(
            result,
            Err(IntegrationError::Validation(
                ValidationError::MissingRejectionNotes
            ))
        ));
    }

    assert_eq!(
        h.store.document("doc-passport").status,
        VerificationStatus::Pending
    );
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn rejection_records_reviewer_but_not_verified_at() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);

    let update = h
        .service
        .update_verification_status(
            &passport,
            VerificationRequest::new(VerificationStatus::Rejected, Some("photo page is blurred")),
            &agent(),
        )
        .expect("agent may reject");

    assert_eq!(update.document.verified_by, Some(UserId::from("agent-1")));
    assert_eq!(update.document.verified_at, None);
    assert_eq!(update.document.history.len(), 1);

    let notice = h
        .notifier
        .sent()
        .into_iter()
        .find(|notice| notice.kind == NotificationKind::DocumentRejected)
        .expect("owner told about rejection");
    assert!(notice.message.contains("photo page is blurred"));
}

#[test]
fn terminal_documents_cannot_be_revived() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    h.service
        .update_verification_status(
            &passport,
            VerificationRequest::new(VerificationStatus::Rejected, Some("expired passport")),
            &admin(),
        )
        .expect("reject");

    let result = h
        .service
        .update_verification_status(&passport, verify(), &admin());
    assert!(matches!(
        result,
        Err(IntegrationError::Validation(ValidationError::InvalidTransition {
            from: VerificationStatus::Rejected,
            to: VerificationStatus::Verified,
        }))
    ));
}

#[test]
fn only_reviewers_may_change_verification_status() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);

    for actor in [applicant(), Actor::new(SPONSOR, Role::Sponsor)] {
        assert!(matches!(
            h.service
                .update_verification_status(&passport, verify(), &actor),
            Err(IntegrationError::Forbidden(_))
        ));
    }
}

#[test]
fn unknown_document_is_not_found() {
    let h = harness();
    let result =
        h.service
            .update_verification_status(&"doc-missing".into(), verify(), &admin());
    assert!(matches!(
        result,
        Err(IntegrationError::NotFound(NotFoundError::Document(_)))
    ));
}

#[test]
fn notification_failures_do_not_undo_the_update() {
    let h = harness_with(Arc::new(FailingNotifier));
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);

    let update = h
        .service
        .update_verification_status(&passport, verify(), &admin())
        .expect("dispatch failures are swallowed");

    assert_eq!(update.document.status, VerificationStatus::Verified);
    assert_eq!(
        h.store.document("doc-passport").status,
        VerificationStatus::Verified
    );
    assert_eq!(h.store.profile(PROFILE).kyc_status, KycStatus::Partial);
}

#[test]
fn verification_without_a_profile_still_succeeds() {
    let h = harness();
    let visa = upload(&h.store, "doc-visa", SPONSOR, DocumentType::Visa);

    let update = h
        .service
        .update_verification_status(&visa, verify(), &admin())
        .expect("missing profile only skips KYC");
    assert_eq!(update.document.status, VerificationStatus::Verified);
}

#[test]
fn eligibility_reports_kyc_and_skill_gaps() {
    let h = harness();
    let profile = ProfileId::from(PROFILE);
    let job = JobId::from(JOB);

    let report = h
        .service
        .check_application_eligibility(&profile, &job, &applicant())
        .expect("owner may check");
    assert!(!report.eligible);
    assert_eq!(report.reasons.len(), 1);
    assert!(report.reasons[0].contains("KYC"));
    assert_eq!(report.warnings.len(), 1);
    assert!(report
        .missing_requirements
        .contains(&"skill: Ventilator management".to_string()));

    upload_verified(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    upload_verified(&h.store, "doc-lease", APPLICANT, DocumentType::RentalAgreement);
    h.service
        .sync_profile_verification_status(&UserId::from(APPLICANT), &admin())
        .expect("sync");

    let report = h
        .service
        .check_application_eligibility(&profile, &job, &agent())
        .expect("agent may check");
    assert!(report.eligible, "warnings never block: {report:?}");
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn eligibility_never_writes() {
    let h = harness();
    let before = h.store.profile(PROFILE);

    h.service
        .check_application_eligibility(&ProfileId::from(PROFILE), &JobId::from(JOB), &admin())
        .expect("admin may check");

    assert_eq!(h.store.profile(PROFILE), before);
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn eligibility_lists_incomplete_sections() {
    let h = harness();
    let report = h
        .service
        .check_application_eligibility(&ProfileId::from("profile-2"), &JobId::from(JOB), &agent())
        .expect("agent may check");

    assert!(!report.eligible);
    assert_eq!(report.reasons.len(), 2);
    for section in ["personalInfo", "education", "experience", "skills"] {
        assert!(report.missing_requirements.contains(&section.to_string()));
    }
}

#[test]
fn eligibility_is_scoped_to_owner_and_staff() {
    let h = harness();
    let result = h.service.check_application_eligibility(
        &ProfileId::from(PROFILE),
        &JobId::from(JOB),
        &Actor::new(OTHER_SEEKER, Role::JobSeeker),
    );
    assert!(matches!(result, Err(IntegrationError::Forbidden(_))));

    let result = h.service.check_application_eligibility(
        &ProfileId::from(PROFILE),
        &JobId::from("job-missing"),
        &admin(),
    );
    assert!(matches!(
        result,
        Err(IntegrationError::NotFound(NotFoundError::Job(_)))
    ));
}

#[test]
fn completeness_is_recomputed_and_persisted() {
    let h = harness();
    let owner = Actor::new(OTHER_SEEKER, Role::JobSeeker);

    let profile = h
        .service
        .update_profile_completeness(&ProfileId::from("profile-2"), &owner)
        .expect("owner may refresh");
    assert!(!profile.completeness.is_complete);
    assert_eq!(profile.completeness.percentage, 0);
    assert_eq!(profile.completeness.missing_fields.len(), 8);
    assert_eq!(h.store.profile("profile-2"), profile);

    let complete = h
        .service
        .update_profile_completeness(&ProfileId::from(PROFILE), &agent())
        .expect("agent may refresh");
    assert!(complete.completeness.is_complete);
    assert_eq!(complete.completeness.percentage, 100);
}

#[test]
fn kyc_status_view_is_self_or_staff() {
    let h = harness();
    let user = UserId::from(APPLICANT);

    let view = h
        .service
        .kyc_status(&user, &applicant())
        .expect("self may read");
    assert_eq!(view.kyc_status, KycStatus::Unverified);
    assert!(!view.kyc_verified);

    assert!(matches!(
        h.service
            .kyc_status(&user, &Actor::new(OTHER_SEEKER, Role::JobSeeker)),
        Err(IntegrationError::Forbidden(_))
    ));
    assert!(matches!(
        h.service.kyc_status(&UserId::from(SPONSOR), &agent()),
        Err(IntegrationError::NotFound(NotFoundError::ProfileForUser(_)))
    ));
}

#[test]
fn application_lifecycle_notifies_the_right_people() {
    let h = harness();
    let application = ApplicationId::from(APPLICATION);
    let sponsor = Actor::new(SPONSOR, Role::Sponsor);

    let shortlisted = h
        .service
        .advance_application_status(
            &application,
            ApplicationStatus::Shortlisted,
            Some("strong ICU background".to_string()),
            &sponsor,
        )
        .expect("sponsor may shortlist");
    assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);
    assert_eq!(h.store.application(APPLICATION).history.len(), 2);
    assert_eq!(
        h.notifier.kinds(),
        vec![NotificationKind::ApplicationStatusChanged]
    );

    h.notifier.clear();
    h.service
        .advance_application_status(&application, ApplicationStatus::Withdrawn, None, &applicant())
        .expect("applicant may withdraw");
    let recipients: Vec<UserId> = h
        .notifier
        .sent()
        .into_iter()
        .map(|notice| notice.recipient)
        .collect();
    assert_eq!(
        recipients,
        vec![UserId::from(APPLICANT), UserId::from(SPONSOR)]
    );

    let reopened = h.service.advance_application_status(
        &application,
        ApplicationStatus::UnderReview,
        None,
        &admin(),
    );
    assert!(matches!(
        reopened,
        Err(IntegrationError::Validation(
            ValidationError::ApplicationClosed { .. }
        ))
    ));
}

#[test]
fn removing_a_verified_document_recomputes_kyc() {
    let h = harness();
    upload_verified(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    let bill = upload_verified(&h.store, "doc-bill", APPLICANT, DocumentType::UtilityBill);
    h.service
        .sync_profile_verification_status(&UserId::from(APPLICANT), &admin())
        .expect("sync");

    let removed = h
        .service
        .remove_document(&bill, &applicant())
        .expect("owner may remove unlinked documents");
    assert_eq!(removed.removed_at, Some(now()));
    assert_eq!(h.store.profile(PROFILE).kyc_status, KycStatus::Partial);

    assert!(matches!(
        h.service.remove_document(&bill, &applicant()),
        Err(IntegrationError::Validation(
            ValidationError::DocumentRemoved(_)
        ))
    ));
}

#[test]
fn linked_documents_cannot_be_removed() {
    let h = harness();
    let passport = upload(&h.store, "doc-passport", APPLICANT, DocumentType::Passport);
    h.service
        .link_documents_to_application(
            &ApplicationId::from(APPLICATION),
            std::slice::from_ref(&passport),
            &applicant(),
        )
        .expect("link");

    assert!(matches!(
        h.service.remove_document(&passport, &admin()),
        Err(IntegrationError::Validation(
            ValidationError::DocumentInUse { .. }
        ))
    ));
    assert!(matches!(
        h.service
            .remove_document(&passport, &Actor::new(OTHER_SEEKER, Role::JobSeeker)),
        Err(IntegrationError::Forbidden(_))
    ));
}
