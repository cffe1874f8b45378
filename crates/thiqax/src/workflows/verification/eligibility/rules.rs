use chrono::{Datelike, NaiveDate};

use super::super::completeness::{assess_completeness, missing_sections};
use super::super::domain::{ExperienceEntry, Job, KycStatus, Profile, Role, User};
use super::EligibilityReport;

pub(crate) fn require_job_seeker(user: &User, report: &mut EligibilityReport) {
    if user.role != Role::JobSeeker {
        report.reasons.push(format!(
            "Only job seekers can apply for jobs (account role is {})",
            user.role.label()
        ));
    }
}

pub(crate) fn require_verified_kyc(profile: &Profile, report: &mut EligibilityReport) {
    if profile.kyc_status != KycStatus::Verified {
        report.reasons.push(format!(
            "KYC verification is required before applying (current status: {})",
            profile.kyc_status.label()
        ));
        report
            .missing_requirements
            .extend(profile.missing_documents.iter().cloned());
    }
}

pub(crate) fn require_complete_profile(profile: &Profile, report: &mut EligibilityReport) {
    let completeness = assess_completeness(profile);
    if completeness.is_complete {
        return;
    }

    let sections = missing_sections(&completeness);
    report.reasons.push(format!(
        "Profile is incomplete ({}% complete); missing: {}",
        completeness.percentage,
        sections.join(", ")
    ));
    report.missing_requirements.extend(sections);
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Missing skills are advisory only.
pub(crate) fn compare_skills(profile: &Profile, job: &Job, report: &mut EligibilityReport) {
    let held: Vec<String> = profile.skills.iter().map(|skill| normalize(skill)).collect();
    let missing: Vec<&String> = job
        .required_skills
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .filter(|skill| !held.contains(&normalize(skill)))
        .collect();

    if missing.is_empty() {
        return;
    }

    report.warnings.push(format!(
        "Profile is missing required skills: {}",
        missing
            .iter()
            .map(|skill| skill.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    report
        .missing_requirements
        .extend(missing.into_iter().map(|skill| format!("skill: {skill}")));
}

/// Experience shortfall is advisory only.
pub(crate) fn compare_experience(
    profile: &Profile,
    job: &Job,
    today: NaiveDate,
    report: &mut EligibilityReport,
) {
    let Some(minimum_years) = job.min_experience_years.filter(|years| *years > 0) else {
        return;
    };

    let months = experience_months(&profile.experience, today);
    let required = u32::from(minimum_years) * 12;
    if months >= required {
        return;
    }

    report.warnings.push(format!(
        "Job asks for {minimum_years} year(s) of experience; profile shows {:.1}",
        months as f32 / 12.0
    ));
    report
        .missing_requirements
        .push(format!("experience: {minimum_years} year(s)"));
}

/// Whole calendar months across all entries; open-ended entries run until `today`.
pub fn experience_months(entries: &[ExperienceEntry], today: NaiveDate) -> u32 {
    entries
        .iter()
        .map(|entry| months_between(entry.start_date, entry.end_date.unwrap_or(today)))
        .sum()
}

fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    months.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: (i32, u32), end: Option<(i32, u32)>) -> ExperienceEntry {
        ExperienceEntry {
            title: "Driver".to_string(),
            employer: "Fleet Co".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, 1).expect("valid"),
            end_date: end.map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1).expect("valid")),
        }
    }

    #[test]
    fn months_accumulate_across_entries() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid");
        let entries = [
            entry((2020, 1), Some((2021, 7))),
            entry((2024, 3), None),
        ];
        assert_eq!(experience_months(&entries, today), 18 + 12);
    }

    #[test]
    fn reversed_dates_do_not_go_negative() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid");
        let entries = [entry((2024, 6), Some((2023, 1)))];
        assert_eq!(experience_months(&entries, today), 0);
    }
}
