use chrono::{DateTime, Utc};

use super::domain::{
    Actor, Application, ApplicationEvent, ApplicationHistoryEntry, ApplicationStatus, Role,
};
use super::errors::{IntegrationError, ValidationError};

/// Move an application along its hiring lifecycle.
///
/// Applicants may only withdraw; agents, sponsors, and admins drive every other step.
/// Accepted, rejected, and withdrawn applications stay closed.
pub fn advance_application(
    application: &Application,
    next_status: ApplicationStatus,
    actor: &Actor,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<Application, IntegrationError> {
    let is_applicant = actor.is(&application.applicant);
    let is_operator = matches!(actor.role, Role::Agent | Role::Sponsor | Role::Admin);

    if !is_operator && !(is_applicant && next_status == ApplicationStatus::Withdrawn) {
        return Err(IntegrationError::forbidden(if is_applicant {
            "applicants may only withdraw their own applications".to_string()
        } else {
            format!(
                "role {} cannot change application status",
                actor.role.label()
            )
        }));
    }

    if application.status.is_terminal() {
        return Err(ValidationError::ApplicationClosed {
            application: application.id.clone(),
            status: application.status.label(),
        }
        .into());
    }

    if application.status == next_status {
        return Err(ValidationError::ApplicationUnchanged {
            application: application.id.clone(),
            status: next_status.label(),
        }
        .into());
    }

    if next_status == ApplicationStatus::Submitted {
        return Err(ValidationError::ApplicationResubmission.into());
    }

    let mut next = application.clone();
    next.status = next_status;
    next.history.push(ApplicationHistoryEntry {
        event: ApplicationEvent::StatusChanged {
            status: next_status,
        },
        actor: actor.id.clone(),
        timestamp: now,
        notes: notes
            .map(|raw| raw.trim().to_string())
            .filter(|trimmed| !trimmed.is_empty()),
    });
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::verification::domain::{JobId, UserId};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid")
    }

    fn application() -> Application {
        Application::submitted("app-1", UserId::from("u-1"), JobId::from("job-1"), now())
    }

    #[test]
    fn applicant_can_withdraw_but_not_shortlist() {
        let applicant = Actor::new("u-1", Role::JobSeeker);

        assert!(matches!(
            advance_application(
                &application(),
                ApplicationStatus::Shortlisted,
                &applicant,
                None,
                now()
            ),
            Err(IntegrationError::Forbidden(_))
        ));

        let withdrawn = advance_application(
            &application(),
            ApplicationStatus::Withdrawn,
            &applicant,
            Some("found another role".to_string()),
            now(),
        )
        .expect("withdrawal allowed");
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
        assert_eq!(withdrawn.history.len(), 2);
    }

    #[test]
    fn terminal_applications_cannot_be_reopened() {
        let sponsor = Actor::new("s-1", Role::Sponsor);
        let accepted = advance_application(
            &application(),
            ApplicationStatus::Accepted,
            &sponsor,
            None,
            now(),
        )
        .expect("sponsor may accept");

        assert!(matches!(
            advance_application(
                &accepted,
                ApplicationStatus::UnderReview,
                &sponsor,
                None,
                now()
            ),
            Err(IntegrationError::Validation(
                ValidationError::ApplicationClosed { .. }
            ))
        ));
    }

    #[test]
    fn other_job_seekers_are_forbidden() {
        let stranger = Actor::new("u-2", Role::JobSeeker);
        assert!(matches!(
            advance_application(
                &application(),
                ApplicationStatus::Withdrawn,
                &stranger,
                None,
                now()
            ),
            Err(IntegrationError::Forbidden(_))
        ));
    }
}
