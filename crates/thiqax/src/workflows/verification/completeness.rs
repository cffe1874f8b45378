use super::domain::{Completeness, Profile};
use super::outcome::Reconciled;

/// Required sections in the order they are reported.
pub const PROFILE_SECTIONS: [&str; 4] = ["personalInfo", "education", "experience", "skills"];

fn present(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|raw| !raw.trim().is_empty())
        .unwrap_or(false)
}

/// Presence check over every required field; a pure function of the profile's sections.
pub fn assess_completeness(profile: &Profile) -> Completeness {
    let info = &profile.personal_info;
    let checks = [
        ("personalInfo.firstName", present(&info.first_name)),
        ("personalInfo.lastName", present(&info.last_name)),
        ("personalInfo.dateOfBirth", info.date_of_birth.is_some()),
        ("personalInfo.nationality", present(&info.nationality)),
        ("personalInfo.phone", present(&info.phone)),
        ("education", !profile.education.is_empty()),
        ("experience", !profile.experience.is_empty()),
        (
            "skills",
            profile.skills.iter().any(|skill| !skill.trim().is_empty()),
        ),
    ];

    let satisfied = checks.iter().filter(|(_, ok)| *ok).count();
    let missing_fields: Vec<String> = checks
        .iter()
        .filter(|(_, ok)| !*ok)
        .map(|(field, _)| field.to_string())
        .collect();

    Completeness {
        is_complete: missing_fields.is_empty(),
        percentage: ((satisfied * 100) / checks.len()) as u8,
        missing_fields,
    }
}

/// Sections with at least one missing field.
pub fn missing_sections(completeness: &Completeness) -> Vec<String> {
    PROFILE_SECTIONS
        .iter()
        .filter(|section| {
            completeness.missing_fields.iter().any(|field| {
                field == *section
                    || field
                        .split_once('.')
                        .map(|(prefix, _)| prefix == **section)
                        .unwrap_or(false)
            })
        })
        .map(|section| section.to_string())
        .collect()
}

/// Refresh the stored completeness block when the derived one differs.
pub fn reconcile_completeness(profile: &Profile) -> Reconciled<Profile> {
    let completeness = assess_completeness(profile);
    if completeness == profile.completeness {
        return Reconciled::unchanged(profile.clone());
    }

    let mut next = profile.clone();
    next.completeness = completeness;
    Reconciled::changed(next, Vec::new())
}
