mod rules;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Job, Profile, User};

pub use rules::experience_months;

/// Outcome of checking whether a profile may apply to a job.
///
/// `reasons` hold hard failures; `warnings` never block eligibility on their own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReport {
    pub eligible: bool,
    pub reasons: Vec<String>,
    pub missing_requirements: Vec<String>,
    pub warnings: Vec<String>,
}

/// Run every rule without short-circuiting; read-only over its inputs.
pub fn evaluate_eligibility(
    user: &User,
    profile: &Profile,
    job: &Job,
    today: NaiveDate,
) -> EligibilityReport {
    let mut report = EligibilityReport::default();

    rules::require_job_seeker(user, &mut report);
    rules::require_verified_kyc(profile, &mut report);
    rules::require_complete_profile(profile, &mut report);
    rules::compare_skills(profile, job, &mut report);
    rules::compare_experience(profile, job, today, &mut report);

    report.eligible = report.reasons.is_empty();
    report
}
