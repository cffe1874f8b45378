use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of an uploaded document.
    DocumentId
);
string_id!(
    /// Identifier of a job seeker profile.
    ProfileId
);
string_id!(
    /// Identifier of a job application.
    ApplicationId
);
string_id!(UserId);
string_id!(JobId);

/// Platform roles recognised by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    JobSeeker,
    Agent,
    Sponsor,
    Admin,
    System,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::JobSeeker => "job-seeker",
            Role::Agent => "agent",
            Role::Sponsor => "sponsor",
            Role::Admin => "admin",
            Role::System => "system",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "job-seeker" | "job_seeker" | "jobseeker" => Ok(Role::JobSeeker),
            "agent" => Ok(Role::Agent),
            "sponsor" => Ok(Role::Sponsor),
            "admin" => Ok(Role::Admin),
            "system" => Ok(Role::System),
            _ => Err(UnknownVariant {
                kind: "role",
                value: value.to_string(),
            }),
        }
    }
}

/// Raised when a wire value does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// The caller on whose behalf a workflow operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            role,
        }
    }

    /// Identity used by scheduled maintenance such as the expiry sweep.
    pub fn system() -> Self {
        Self::new("system", Role::System)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Agent | Role::System)
    }

    pub fn is(&self, user: &UserId) -> bool {
        &self.id == user
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Passport,
    NationalId,
    DriverLicense,
    AddressProof,
    UtilityBill,
    BankStatement,
    RentalAgreement,
    Diploma,
    Degree,
    Certificate,
    EmploymentLetter,
    ReferenceLetter,
    WorkPermit,
    Visa,
    Other,
}

impl DocumentType {
    /// Fixed grouping used for KYC gating and reporting; `Other` carries no category.
    pub const fn category(self) -> Option<DocumentCategory> {
        match self {
            DocumentType::Passport | DocumentType::NationalId | DocumentType::DriverLicense => {
                Some(DocumentCategory::Identity)
            }
            DocumentType::AddressProof
            | DocumentType::UtilityBill
            | DocumentType::BankStatement
            | DocumentType::RentalAgreement => Some(DocumentCategory::Address),
            DocumentType::Diploma | DocumentType::Degree | DocumentType::Certificate => {
                Some(DocumentCategory::Education)
            }
            DocumentType::EmploymentLetter
            | DocumentType::ReferenceLetter
            | DocumentType::WorkPermit
            | DocumentType::Visa => Some(DocumentCategory::Professional),
            DocumentType::Other => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentType::Passport => "passport",
            DocumentType::NationalId => "national ID",
            DocumentType::DriverLicense => "driver's license",
            DocumentType::AddressProof => "proof of address",
            DocumentType::UtilityBill => "utility bill",
            DocumentType::BankStatement => "bank statement",
            DocumentType::RentalAgreement => "rental agreement",
            DocumentType::Diploma => "diploma",
            DocumentType::Degree => "degree",
            DocumentType::Certificate => "certificate",
            DocumentType::EmploymentLetter => "employment letter",
            DocumentType::ReferenceLetter => "reference letter",
            DocumentType::WorkPermit => "work permit",
            DocumentType::Visa => "visa",
            DocumentType::Other => "document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentCategory {
    Identity,
    Address,
    Education,
    Professional,
}

/// Lifecycle of a single uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Pending,
    UnderReview,
    Verified,
    Rejected,
    Expired,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::UnderReview => "under-review",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Expired => "expired",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            VerificationStatus::Rejected | VerificationStatus::Expired
        )
    }

    /// Forward-only transitions; a re-upload creates a new document instead.
    pub fn can_transition_to(self, next: VerificationStatus) -> bool {
        use VerificationStatus::*;

        matches!(
            (self, next),
            (Pending, UnderReview | Verified | Rejected | Expired)
                | (UnderReview, Verified | Rejected | Expired)
                | (Verified, Expired)
        )
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VerificationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(VerificationStatus::Pending),
            "under-review" => Ok(VerificationStatus::UnderReview),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            "expired" => Ok(VerificationStatus::Expired),
            _ => Err(UnknownVariant {
                kind: "verification status",
                value: value.to_string(),
            }),
        }
    }
}

/// Audit entry appended on every verification transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHistoryEntry {
    pub status: VerificationStatus,
    pub notes: Option<String>,
    pub actor: UserId,
    pub timestamp: DateTime<Utc>,
}

/// One uploaded file and its verification metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub document_type: DocumentType,
    pub status: VerificationStatus,
    pub notes: Option<String>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_notified: bool,
    pub application_id: Option<ApplicationId>,
    pub profile_id: Option<ProfileId>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<DocumentHistoryEntry>,
}

impl Document {
    /// Fresh upload awaiting review.
    pub fn uploaded(
        id: impl Into<String>,
        owner: UserId,
        document_type: DocumentType,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId(id.into()),
            owner,
            document_type,
            status: VerificationStatus::Pending,
            notes: None,
            verified_by: None,
            verified_at: None,
            expiry_date: None,
            expiry_notified: false,
            application_id: None,
            profile_id: None,
            uploaded_at,
            removed_at: None,
            history: Vec::new(),
        }
    }

    pub fn category(&self) -> Option<DocumentCategory> {
        self.document_type.category()
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// Verified and still held by the owner.
    pub fn counts_as_verified(&self) -> bool {
        self.status == VerificationStatus::Verified && !self.is_removed()
    }
}

/// Derived KYC level of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KycStatus {
    #[default]
    Unverified,
    Pending,
    Partial,
    Verified,
}

impl KycStatus {
    pub const fn label(self) -> &'static str {
        match self {
            KycStatus::Unverified => "unverified",
            KycStatus::Pending => "pending",
            KycStatus::Partial => "partial",
            KycStatus::Verified => "verified",
        }
    }
}

/// Verified document ids per category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBreakdown {
    pub identity: Vec<DocumentId>,
    pub address: Vec<DocumentId>,
    pub education: Vec<DocumentId>,
    pub professional: Vec<DocumentId>,
}

impl VerificationBreakdown {
    pub fn bucket(&self, category: DocumentCategory) -> &[DocumentId] {
        match category {
            DocumentCategory::Identity => &self.identity,
            DocumentCategory::Address => &self.address,
            DocumentCategory::Education => &self.education,
            DocumentCategory::Professional => &self.professional,
        }
    }

    pub(crate) fn bucket_mut(&mut self, category: DocumentCategory) -> &mut Vec<DocumentId> {
        match category {
            DocumentCategory::Identity => &mut self.identity,
            DocumentCategory::Address => &mut self.address,
            DocumentCategory::Education => &mut self.education,
            DocumentCategory::Professional => &mut self.professional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub institution: String,
    pub qualification: String,
    pub completed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub employer: String,
    pub start_date: NaiveDate,
    /// Open-ended when the position is current.
    pub end_date: Option<NaiveDate>,
}

/// Derived completion state of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    pub is_complete: bool,
    pub percentage: u8,
    pub missing_fields: Vec<String>,
}

/// A job seeker's structured profile plus the aggregates derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub completeness: Completeness,
    #[serde(default)]
    pub kyc_status: KycStatus,
    #[serde(default)]
    pub verification: VerificationBreakdown,
    #[serde(default)]
    pub missing_documents: Vec<String>,
    pub last_kyc_update: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: ProfileId(id.into()),
            user_id,
            personal_info: PersonalInfo::default(),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
            completeness: Completeness::default(),
            kyc_status: KycStatus::Unverified,
            verification: VerificationBreakdown::default(),
            missing_documents: Vec::new(),
            last_kyc_update: None,
        }
    }
}

/// Hiring lifecycle of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Shortlisted,
    InterviewScheduled,
    Offered,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::InterviewScheduled => "interview-scheduled",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under-review" => Ok(ApplicationStatus::UnderReview),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interview-scheduled" => Ok(ApplicationStatus::InterviewScheduled),
            "offered" => Ok(ApplicationStatus::Offered),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            _ => Err(UnknownVariant {
                kind: "application status",
                value: value.to_string(),
            }),
        }
    }
}

/// Aggregate over the verification status of an application's linked documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Verified => "verified",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ApplicationEvent {
    StatusChanged { status: ApplicationStatus },
    DocumentsAdded {
        #[serde(rename = "documentIds")]
        document_ids: Vec<DocumentId>,
    },
    DocumentStatusChanged {
        #[serde(rename = "documentStatus")]
        document_status: DocumentStatus,
    },
}

/// Append-only log entry on an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHistoryEntry {
    pub event: ApplicationEvent,
    pub actor: UserId,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// One job-seeker-to-job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: UserId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub document_status: DocumentStatus,
    #[serde(default)]
    pub document_ids: BTreeSet<DocumentId>,
    #[serde(default)]
    pub history: Vec<ApplicationHistoryEntry>,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    pub fn submitted(
        id: impl Into<String>,
        applicant: UserId,
        job_id: JobId,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId(id.into()),
            history: vec![ApplicationHistoryEntry {
                event: ApplicationEvent::StatusChanged {
                    status: ApplicationStatus::Submitted,
                },
                actor: applicant.clone(),
                timestamp: submitted_at,
                notes: None,
            }],
            applicant,
            job_id,
            status: ApplicationStatus::Submitted,
            document_status: DocumentStatus::Pending,
            document_ids: BTreeSet::new(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    pub email: String,
    /// Denormalized mirror of the profile's KYC state, when the account carries one.
    #[serde(default)]
    pub kyc_verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub posted_by: UserId,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub min_experience_years: Option<u8>,
}
