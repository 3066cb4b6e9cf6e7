use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted benefit applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for registered applicants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an application as it moves through administrative review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Statuses that count as an open claim on the scheme.
    pub const ACTIVE: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Citizens may only touch their documents before a decision is recorded.
    pub fn accepts_document_changes(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::UnderReview
        )
    }
}

/// Supporting evidence categories accepted by the scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Aadhaar,
    BankStatement,
    IncomeCertificate,
    ResidentCertificate,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "aadhaar",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::IncomeCertificate => "income_certificate",
            DocumentType::ResidentCertificate => "resident_certificate",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields the citizen fills in on the application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationData {
    pub full_name: String,
    pub age: u8,
    pub district: String,
    pub block: String,
    pub panchayat: String,
    pub village: String,
    pub monthly_income: u64,
    #[serde(default)]
    pub dependents: u8,
    pub bank_account: String,
    pub ifsc_code: String,
    pub bank_name: String,
}

pub const MINIMUM_APPLICANT_AGE: u8 = 18;
pub const MAXIMUM_APPLICANT_AGE: u8 = 65;

impl ApplicationData {
    /// Reject forms with blank required fields or an age outside the scheme's band.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("full_name", &self.full_name),
            ("district", &self.district),
            ("block", &self.block),
            ("panchayat", &self.panchayat),
            ("village", &self.village),
            ("bank_account", &self.bank_account),
            ("ifsc_code", &self.ifsc_code),
            ("bank_name", &self.bank_name),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::MissingField(*field));
        }

        if !(MINIMUM_APPLICANT_AGE..=MAXIMUM_APPLICANT_AGE).contains(&self.age) {
            return Err(ValidationError::AgeOutOfRange(self.age));
        }

        Ok(())
    }
}

/// Document as uploaded by the citizen, before any administrative review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedDocument {
    pub doc_type: DocumentType,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Stored document together with its verification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocument {
    pub doc_type: DocumentType,
    pub file_url: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
}

impl From<SubmittedDocument> for ApplicationDocument {
    fn from(document: SubmittedDocument) -> Self {
        Self {
            doc_type: document.doc_type,
            file_url: document.file_url,
            verified: false,
            verification_notes: None,
        }
    }
}

/// One administrative status transition. The history is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub status: ApplicationStatus,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Persisted benefit application.
///
/// `risk_score` and `last_updated` are owned by
/// [`ApplicationRiskScorer::before_save`](super::risk::ApplicationRiskScorer::before_save)
/// and can only be read from outside the crate. Deserialization still restores them
/// verbatim, so a rehydrated record must pass through `before_save` before its score
/// is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub application_data: ApplicationData,
    pub documents: Vec<ApplicationDocument>,
    pub verification_history: Vec<VerificationEntry>,
    pub(crate) risk_score: u8,
    pub submission_date: DateTime<Utc>,
    pub(crate) last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_coordinates: Option<LocationCoordinates>,
}

impl Application {
    /// Fresh pending application. The score stays at zero until the first save.
    pub fn new(
        id: ApplicationId,
        user_id: UserId,
        application_data: ApplicationData,
        documents: Vec<ApplicationDocument>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            status: ApplicationStatus::Pending,
            application_data,
            documents,
            verification_history: Vec::new(),
            risk_score: 0,
            submission_date: submitted_at,
            last_updated: submitted_at,
            location_coordinates: None,
        }
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn document(&self, doc_type: DocumentType) -> Option<&ApplicationDocument> {
        self.documents.iter().find(|doc| doc.doc_type == doc_type)
    }

    pub fn rejection_count(&self) -> usize {
        self.verification_history
            .iter()
            .filter(|entry| entry.status == ApplicationStatus::Rejected)
            .count()
    }

    pub fn unverified_document_count(&self) -> usize {
        self.documents.iter().filter(|doc| !doc.verified).count()
    }
}

/// Home address recorded at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentialAddress {
    pub district: String,
    pub block: String,
    pub panchayat: String,
}

/// Registered citizen. Credentials live with the excluded auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub aadhaar_number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ResidentialAddress>,
}

/// Registration payload for a new applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplicant {
    pub aadhaar_number: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<ResidentialAddress>,
}

pub const AADHAAR_DIGITS: usize = 12;

impl NewApplicant {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_well_formed_aadhaar(&self.aadhaar_number) {
            return Err(ValidationError::InvalidAadhaar);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        Ok(())
    }
}

pub fn is_well_formed_aadhaar(value: &str) -> bool {
    value.len() == AADHAAR_DIGITS && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Everything the citizen sends when applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub application_data: ApplicationData,
    #[serde(default)]
    pub documents: Option<Vec<SubmittedDocument>>,
    #[serde(default)]
    pub location_coordinates: Option<LocationCoordinates>,
}

/// Administrative decision recorded against an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub notes: String,
    #[serde(default)]
    pub verified_by: Option<String>,
}

/// Reviewer verdict on a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReview {
    pub verified: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Shape errors raised before anything touches the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("age must be between 18 and 65 (found {0})")]
    AgeOutOfRange(u8),
    #[error("aadhaar number must be exactly 12 digits")]
    InvalidAadhaar,
    #[error("notes are required for a status change")]
    MissingNotes,
}
