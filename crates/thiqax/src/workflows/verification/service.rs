use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::access::{require_owner_or_role, require_role, ADMINS, REVIEWERS, STAFF};
use super::aggregate::reconcile_application;
use super::completeness::reconcile_completeness;
use super::domain::{
    Actor, Application, ApplicationId, ApplicationStatus, Document, DocumentId, JobId,
    KycStatus, Profile, ProfileId, Role, UnknownVariant, UserId, VerificationBreakdown,
    VerificationStatus,
};
use super::eligibility::{evaluate_eligibility, EligibilityReport};
use super::errors::{IntegrationError, NotFoundError, ValidationError};
use super::expiry::{expiry_note, mark_reminded, plan_expirations, ExpirySweepSummary};
use super::kyc::reconcile_kyc;
use super::lifecycle::advance_application;
use super::linking::plan_link;
use super::notices;
use super::repository::{Notification, NotificationDispatcher, RepositoryError, WorkflowStore};
use super::transition::{apply_verification, soft_remove, VerificationRequest};
use crate::config::WorkflowConfig;

/// Time source, injectable so the workflow can be exercised at fixed instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of a verification decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationUpdate {
    pub document: Document,
    pub application: Option<Application>,
}

/// Read-only KYC summary for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycStatusView {
    pub user_id: UserId,
    pub kyc_status: KycStatus,
    pub kyc_verified: bool,
    pub verification: VerificationBreakdown,
    pub missing_documents: Vec<String>,
    pub last_kyc_update: Option<DateTime<Utc>>,
}

impl From<&Profile> for KycStatusView {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            kyc_status: profile.kyc_status,
            kyc_verified: profile.kyc_status == KycStatus::Verified,
            verification: profile.verification.clone(),
            missing_documents: profile.missing_documents.clone(),
            last_kyc_update: profile.last_kyc_update,
        }
    }
}

/// Entity whose dependent aggregates should be re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileTarget {
    Document(DocumentId),
    Application(ApplicationId),
    Profile(ProfileId),
    User(UserId),
}

impl ReconcileTarget {
    pub fn parse(kind: &str, id: &str) -> Result<Self, ValidationError> {
        let id = id.to_string();
        match kind.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" => Ok(Self::Document(DocumentId(id))),
            "application" | "applications" => Ok(Self::Application(ApplicationId(id))),
            "profile" | "profiles" => Ok(Self::Profile(ProfileId(id))),
            "user" | "users" => Ok(Self::User(UserId(id))),
            _ => Err(UnknownVariant {
                kind: "reconcile target",
                value: kind.to_string(),
            }
            .into()),
        }
    }
}

/// Aggregates touched by a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub applications: Vec<Application>,
    pub profile: Option<Profile>,
}

/// Service composing the store, the pure workflow rules, and notification dispatch.
///
/// Each operation commits its primary write before any secondary reconciliation reads it.
/// Secondary failures are logged and left for the next reconciliation pass.
pub struct VerificationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
}

impl<S, N> VerificationService<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: WorkflowConfig) -> Self {
        Self::with_clock(store, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        config: WorkflowConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Record a reviewer decision on a document and propagate it.
    pub fn update_verification_status(
        &self,
        document_id: &DocumentId,
        request: VerificationRequest,
        actor: &Actor,
    ) -> Result<VerificationUpdate, IntegrationError> {
        require_role(actor, REVIEWERS, "review documents")?;
        self.transition_document(document_id, &request, actor)
    }

    /// Attach the applicant's documents to an application.
    pub fn link_documents_to_application(
        &self,
        application_id: &ApplicationId,
        document_ids: &[DocumentId],
        actor: &Actor,
    ) -> Result<Application, IntegrationError> {
        require_role(
            actor,
            &[Role::JobSeeker, Role::Agent, Role::Admin],
            "link documents to applications",
        )?;
        if document_ids.is_empty() {
            return Err(ValidationError::EmptyDocumentIds.into());
        }

        let now = self.clock.now();
        let application = self
            .store
            .fetch_application(application_id)?
            .ok_or_else(|| NotFoundError::Application(application_id.clone()))?;
        if actor.role == Role::JobSeeker && !actor.is(&application.applicant) {
            return Err(IntegrationError::forbidden(
                "job seekers may only link documents to their own applications",
            ));
        }

        let (found, _) = self.load_documents(document_ids)?;
        let plan = plan_link(&application, document_ids, found, actor, now)?;

        let (mut linked, _) = self.load_documents(
            plan.application
                .document_ids
                .iter()
                .filter(|id| !plan.documents.iter().any(|document| &document.id == *id)),
        )?;
        linked.extend(plan.documents.iter().cloned());
        let outcome = reconcile_application(&plan.application, &linked, actor, now);
        let application = outcome.record;

        self.store.update_application(application.clone())?;
        for document in plan.documents {
            self.store.update_document(document)?;
        }
        info!(
            application = %application.id,
            added = plan.added.len(),
            actor = %actor.id,
            document_status = application.document_status.label(),
            "documents linked to application"
        );

        let job = match self.store.fetch_job(&application.job_id) {
            Ok(job) => job,
            Err(error) => {
                warn!(job = %application.job_id, %error, "job lookup failed while notifying");
                None
            }
        };

        let mut notifications = outcome.notifications;
        notifications.push(notices::documents_linked(
            &application,
            &application.applicant,
            plan.added.len(),
            job.as_ref(),
        ));
        if !actor.is(&application.applicant) {
            match &job {
                Some(job) => notifications.push(notices::documents_linked(
                    &application,
                    &job.posted_by,
                    plan.added.len(),
                    Some(job),
                )),
                None => warn!(
                    application = %application.id,
                    "job poster could not be resolved for link notification"
                ),
            }
        }
        self.notify(notifications);

        Ok(application)
    }

    /// Recompute a user's KYC status from the documents they currently hold.
    pub fn sync_profile_verification_status(
        &self,
        user_id: &UserId,
        actor: &Actor,
    ) -> Result<Profile, IntegrationError> {
        require_role(actor, REVIEWERS, "sync verification status")?;
        self.reconcile_user_kyc(user_id, self.clock.now())
    }

    /// Decide whether a profile may apply to a job. Never writes.
    pub fn check_application_eligibility(
        &self,
        profile_id: &ProfileId,
        job_id: &JobId,
        actor: &Actor,
    ) -> Result<EligibilityReport, IntegrationError> {
        let profile = self.fetch_profile(profile_id)?;
        require_owner_or_role(
            actor,
            &profile.user_id,
            STAFF,
            "check eligibility for this profile",
        )?;
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or_else(|| NotFoundError::Job(job_id.clone()))?;
        let user = self
            .store
            .fetch_user(&profile.user_id)?
            .ok_or_else(|| NotFoundError::User(profile.user_id.clone()))?;

        let report = evaluate_eligibility(&user, &profile, &job, self.clock.now().date_naive());
        debug!(
            profile = %profile.id,
            job = %job.id,
            eligible = report.eligible,
            warnings = report.warnings.len(),
            "eligibility evaluated"
        );
        Ok(report)
    }

    /// Remind owners about documents nearing expiry and expire the overdue ones.
    ///
    /// `days_threshold` falls back to the configured window.
    pub fn check_document_expirations(
        &self,
        days_threshold: Option<i64>,
        actor: &Actor,
    ) -> Result<ExpirySweepSummary, IntegrationError> {
        require_role(actor, ADMINS, "run the document expiry sweep")?;
        let days = days_threshold.unwrap_or(self.config.expiry_window_days);
        if days < 0 {
            return Err(ValidationError::InvalidExpiryWindow(days).into());
        }

        let now = self.clock.now();
        let window = Duration::days(days);
        let candidates = self.store.documents_expiring_before(now + window)?;
        let plan = plan_expirations(candidates, now, window);
        let mut summary = ExpirySweepSummary::default();

        for document in &plan.reminders {
            let Some(expires_at) = document.expiry_date else {
                continue;
            };

            let mut notifications = vec![notices::document_expiring(
                document,
                &document.owner,
                expires_at,
                now,
            )];
            if let Some(poster) = self.job_poster_for(document) {
                notifications.push(notices::document_expiring(
                    document, &poster, expires_at, now,
                ));
            }
            self.notify(notifications);

            match self.store.update_document(mark_reminded(document)) {
                Ok(()) => {
                    summary.notified_count += 1;
                    summary.processed_count += 1;
                }
                Err(error) => warn!(
                    document = %document.id,
                    %error,
                    "failed to record expiry reminder"
                ),
            }
        }

        let sweeper = Actor::system();
        for document in &plan.expirations {
            let request = VerificationRequest {
                status: VerificationStatus::Expired,
                notes: Some(expiry_note(document)),
            };
            match self.transition_document(&document.id, &request, &sweeper) {
                Ok(_) => {
                    summary.expired_count += 1;
                    summary.processed_count += 1;
                }
                Err(error) => warn!(document = %document.id, %error, "failed to expire document"),
            }
        }

        info!(
            processed = summary.processed_count,
            notified = summary.notified_count,
            expired = summary.expired_count,
            window_days = days,
            "document expiry sweep finished"
        );
        Ok(summary)
    }

    /// Re-derive the document status of every application the profile owner has filed.
    pub fn sync_profile_applications(
        &self,
        profile_id: &ProfileId,
        actor: &Actor,
    ) -> Result<Vec<Application>, IntegrationError> {
        let profile = self.fetch_profile(profile_id)?;
        require_owner_or_role(
            actor,
            &profile.user_id,
            STAFF,
            "sync applications for this profile",
        )?;
        self.reconcile_applications_for(&profile.user_id, actor, self.clock.now())
    }

    /// Refresh the derived completeness block of a profile.
    pub fn update_profile_completeness(
        &self,
        profile_id: &ProfileId,
        actor: &Actor,
    ) -> Result<Profile, IntegrationError> {
        let profile = self.fetch_profile(profile_id)?;
        require_owner_or_role(actor, &profile.user_id, STAFF, "update this profile")?;
        self.refresh_completeness(profile)
    }

    pub fn kyc_status(
        &self,
        user_id: &UserId,
        actor: &Actor,
    ) -> Result<KycStatusView, IntegrationError> {
        require_owner_or_role(actor, user_id, STAFF, "view KYC status for this user")?;
        let profile = self
            .store
            .profile_for_user(user_id)?
            .ok_or_else(|| NotFoundError::ProfileForUser(user_id.clone()))?;
        Ok(KycStatusView::from(&profile))
    }

    /// Re-derive every aggregate that depends on `target`; safe to repeat after a partial
    /// failure.
    pub fn reconcile(
        &self,
        target: &ReconcileTarget,
        actor: &Actor,
    ) -> Result<ReconcileReport, IntegrationError> {
        require_role(actor, ADMINS, "run reconciliation")?;
        let now = self.clock.now();
        let mut report = ReconcileReport::default();

        match target {
            ReconcileTarget::Document(document_id) => {
                let document = self
                    .store
                    .fetch_document(document_id)?
                    .ok_or_else(|| NotFoundError::Document(document_id.clone()))?;
                if let Some(application) =
                    self.reconcile_linked_application(&document, actor, now)?
                {
                    report.applications.push(application);
                }
                report.profile = self.reconcile_kyc_if_profiled(&document.owner, now)?;
            }
            ReconcileTarget::Application(application_id) => {
                let application = self
                    .store
                    .fetch_application(application_id)?
                    .ok_or_else(|| NotFoundError::Application(application_id.clone()))?;
                report
                    .applications
                    .push(self.reconcile_application_record(application, actor, now)?);
            }
            ReconcileTarget::Profile(profile_id) => {
                let profile = self.fetch_profile(profile_id)?;
                let user_id = profile.user_id.clone();
                self.refresh_completeness(profile)?;
                report.profile = Some(self.reconcile_user_kyc(&user_id, now)?);
                report.applications = self.reconcile_applications_for(&user_id, actor, now)?;
            }
            ReconcileTarget::User(user_id) => {
                report.profile = Some(self.reconcile_user_kyc(user_id, now)?);
                report.applications = self.reconcile_applications_for(user_id, actor, now)?;
            }
        }

        info!(
            reconcile_target = ?target,
            applications = report.applications.len(),
            profile = report.profile.is_some(),
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Advance an application through its hiring lifecycle.
    pub fn advance_application_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<Application, IntegrationError> {
        let application = self
            .store
            .fetch_application(application_id)?
            .ok_or_else(|| NotFoundError::Application(application_id.clone()))?;
        let next = advance_application(&application, status, actor, notes, self.clock.now())?;
        self.store.update_application(next.clone())?;
        info!(
            application = %next.id,
            from = application.status.label(),
            to = next.status.label(),
            actor = %actor.id,
            "application status advanced"
        );

        let mut notifications = vec![notices::application_status(&next, &next.applicant)];
        if next.status == ApplicationStatus::Withdrawn {
            match self.store.fetch_job(&next.job_id) {
                Ok(Some(job)) => {
                    notifications.push(notices::application_status(&next, &job.posted_by))
                }
                Ok(None) => warn!(job = %next.job_id, "withdrawn application references a missing job"),
                Err(error) => warn!(job = %next.job_id, %error, "job lookup failed while notifying"),
            }
        }
        self.notify(notifications);

        Ok(next)
    }

    /// Soft-remove a document that no application references any more.
    pub fn remove_document(
        &self,
        document_id: &DocumentId,
        actor: &Actor,
    ) -> Result<Document, IntegrationError> {
        let document = self
            .store
            .fetch_document(document_id)?
            .ok_or_else(|| NotFoundError::Document(document_id.clone()))?;
        require_owner_or_role(actor, &document.owner, &[Role::Admin], "remove this document")?;

        let referencing = match &document.application_id {
            Some(application_id) => self.store.fetch_application(application_id)?,
            None => None,
        };
        let now = self.clock.now();
        let removed = soft_remove(&document, referencing.as_ref(), now)?;
        self.store.update_document(removed.clone())?;
        info!(document = %removed.id, actor = %actor.id, "document removed");

        if document.counts_as_verified() && document.category().is_some() {
            if let Err(error) = self.reconcile_user_kyc(&document.owner, now) {
                warn!(user = %document.owner, %error, "KYC reconciliation failed after removal");
            }
        }

        Ok(removed)
    }

    fn transition_document(
        &self,
        document_id: &DocumentId,
        request: &VerificationRequest,
        actor: &Actor,
    ) -> Result<VerificationUpdate, IntegrationError> {
        let now = self.clock.now();
        let current = self
            .store
            .fetch_document(document_id)?
            .ok_or_else(|| NotFoundError::Document(document_id.clone()))?;
        let document = apply_verification(&current, request, actor, now)?;
        self.store.update_document(document.clone())?;
        info!(
            document = %document.id,
            from = %current.status,
            to = %document.status,
            actor = %actor.id,
            "document verification status updated"
        );

        let application = match self.reconcile_linked_application(&document, actor, now) {
            Ok(application) => application,
            Err(error) => {
                warn!(
                    document = %document.id,
                    %error,
                    "application reconciliation failed after verification update"
                );
                None
            }
        };

        if document.category().is_some() {
            if let Err(error) = self.reconcile_user_kyc(&document.owner, now) {
                warn!(
                    user = %document.owner,
                    %error,
                    "KYC reconciliation failed after verification update"
                );
            }
        }

        self.notify(vec![notices::document_status(&document)]);

        Ok(VerificationUpdate {
            document,
            application,
        })
    }

    fn reconcile_linked_application(
        &self,
        document: &Document,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Option<Application>, IntegrationError> {
        let Some(application_id) = &document.application_id else {
            return Ok(None);
        };
        let Some(application) = self.store.fetch_application(application_id)? else {
            warn!(
                document = %document.id,
                application = %application_id,
                "document references a missing application"
            );
            return Ok(None);
        };

        self.reconcile_application_record(application, actor, now)
            .map(Some)
    }

    fn reconcile_application_record(
        &self,
        application: Application,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Application, IntegrationError> {
        let (documents, missing) = self.load_documents(&application.document_ids)?;
        if !missing.is_empty() {
            debug!(
                application = %application.id,
                missing = missing.len(),
                "application links to documents that no longer exist"
            );
        }

        let outcome = reconcile_application(&application, &documents, actor, now);
        if outcome.changed {
            self.store.update_application(outcome.record.clone())?;
            info!(
                application = %outcome.record.id,
                document_status = outcome.record.document_status.label(),
                "application document status recomputed"
            );
            self.notify(outcome.notifications);
        } else {
            debug!(application = %application.id, "application document status unchanged");
        }

        Ok(outcome.record)
    }

    fn reconcile_applications_for(
        &self,
        applicant: &UserId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Application>, IntegrationError> {
        self.store
            .applications_for_applicant(applicant)?
            .into_iter()
            .map(|application| self.reconcile_application_record(application, actor, now))
            .collect()
    }

    fn reconcile_user_kyc(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Profile, IntegrationError> {
        let profile = self
            .store
            .profile_for_user(user_id)?
            .ok_or_else(|| NotFoundError::ProfileForUser(user_id.clone()))?;
        let documents = self.store.documents_for_owner(user_id)?;

        let outcome = reconcile_kyc(&profile, &documents, now);
        if outcome.changed {
            self.store.update_profile(outcome.record.clone())?;
            info!(
                user = %user_id,
                from = profile.kyc_status.label(),
                to = outcome.record.kyc_status.label(),
                "profile KYC status recomputed"
            );
        } else {
            debug!(user = %user_id, "profile KYC status unchanged");
        }

        self.mirror_kyc(user_id, outcome.record.kyc_status);
        self.notify(outcome.notifications);
        Ok(outcome.record)
    }

    fn reconcile_kyc_if_profiled(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Profile>, IntegrationError> {
        match self.reconcile_user_kyc(user_id, now) {
            Ok(profile) => Ok(Some(profile)),
            Err(IntegrationError::NotFound(NotFoundError::ProfileForUser(_))) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn refresh_completeness(&self, profile: Profile) -> Result<Profile, IntegrationError> {
        let outcome = reconcile_completeness(&profile);
        if outcome.changed {
            self.store.update_profile(outcome.record.clone())?;
            info!(
                profile = %outcome.record.id,
                percentage = outcome.record.completeness.percentage,
                complete = outcome.record.completeness.is_complete,
                "profile completeness updated"
            );
        }
        Ok(outcome.record)
    }

    /// Keep the account-level `kyc_verified` flag in step, when the account carries one.
    fn mirror_kyc(&self, user_id: &UserId, status: KycStatus) {
        let verified = status == KycStatus::Verified;
        let result = self.store.fetch_user(user_id).and_then(|user| match user {
            Some(mut user) if user.kyc_verified.is_some_and(|current| current != verified) => {
                user.kyc_verified = Some(verified);
                self.store.update_user(user)
            }
            _ => Ok(()),
        });

        if let Err(error) = result {
            warn!(user = %user_id, %error, "failed to mirror KYC status onto user");
        }
    }

    fn job_poster_for(&self, document: &Document) -> Option<UserId> {
        let application_id = document.application_id.as_ref()?;
        let lookup = self
            .store
            .fetch_application(application_id)
            .and_then(|application| match application {
                Some(application) => self.store.fetch_job(&application.job_id),
                None => Ok(None),
            });

        match lookup {
            Ok(job) => job.map(|job| job.posted_by),
            Err(error) => {
                warn!(document = %document.id, %error, "job poster lookup failed");
                None
            }
        }
    }

    fn fetch_profile(&self, profile_id: &ProfileId) -> Result<Profile, IntegrationError> {
        Ok(self
            .store
            .fetch_profile(profile_id)?
            .ok_or_else(|| NotFoundError::Profile(profile_id.clone()))?)
    }

    /// Fetch each distinct id once, splitting hits from misses.
    fn load_documents<'a, I>(
        &self,
        ids: I,
    ) -> Result<(Vec<Document>, Vec<DocumentId>), RepositoryError>
    where
        I: IntoIterator<Item = &'a DocumentId>,
    {
        let ids: BTreeSet<&DocumentId> = ids.into_iter().collect();
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.store.fetch_document(id)? {
                Some(document) => found.push(document),
                None => missing.push(id.clone()),
            }
        }

        Ok((found, missing))
    }

    /// Dispatch best-effort; failures never undo the state change that triggered them.
    fn notify(&self, notifications: Vec<Notification>) -> usize {
        let mut delivered = 0;
        for notification in notifications {
            let recipient = notification.recipient.clone();
            let kind = notification.kind;
            match self.notifier.dispatch(notification) {
                Ok(()) => delivered += 1,
                Err(error) => warn!(
                    recipient = %recipient,
                    kind = ?kind,
                    %error,
                    "notification dispatch failed"
                ),
            }
        }
        delivered
    }
}
