//! Submission-time fraud screening.
//!
//! [`FraudDetector::detect_fraud`] runs the pattern checks in a fixed order, then folds
//! in the independently weighted [`FraudDetector::calculate_risk_score`]. Neither call
//! ever returns an error: repository failures and timeouts degrade to a medium-risk
//! result that is logged and left for human review.

mod documents;
mod patterns;
mod policy;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::domain::{ApplicationData, SubmittedDocument};
use super::repository::{FraudLookup, RepositoryError};

pub use documents::{
    AcceptAllDocuments, DocumentInspector, DocumentQuality, FormatDocumentInspector,
    DEFAULT_ALLOWED_FORMATS, DEFAULT_MAX_DOCUMENT_BYTES,
};
pub use patterns::{first_name_token, is_duplicate_aadhaar, is_ghost_applicant};
pub use policy::{
    AadhaarPattern, FraudPolicy, SignalWeights, DEFAULT_GHOST_ADDRESS_TOKENS,
    DEFAULT_GHOST_NAMES, DEFAULT_HIGH_RISK_DISTRICTS,
};

pub const NO_FRAUD_MESSAGE: &str = "No fraud detected";
pub const SCREENING_ERROR_MESSAGE: &str = "Error during fraud detection";

/// Structured location as captured on the application form.
///
/// Keys other than the four administrative levels are kept in `extra` so that
/// placeholder matching sees every value the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAddress {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub panchayat: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Applicant address, either free-form or structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicantAddress {
    Line(String),
    Structured(LocationAddress),
}

impl ApplicantAddress {
    /// Single string used for placeholder-token matching.
    pub fn flatten(&self) -> String {
        match self {
            ApplicantAddress::Line(line) => line.clone(),
            ApplicantAddress::Structured(location) => [
                &location.district,
                &location.block,
                &location.panchayat,
                &location.village,
            ]
            .into_iter()
            .flatten()
            .cloned()
            .chain(location.extra.values().filter_map(extra_value_text))
            .collect::<Vec<_>>()
            .join(" "),
        }
    }

    fn location(&self) -> Option<&LocationAddress> {
        match self {
            ApplicantAddress::Structured(location) => Some(location),
            ApplicantAddress::Line(_) => None,
        }
    }
}

fn extra_value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Ephemeral screening input assembled at submission time. Absent fields are absent
/// signals: checks depending on them evaluate as non-matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudCheckInput {
    #[serde(default)]
    pub aadhaar: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<ApplicantAddress>,
    #[serde(default)]
    pub documents: Vec<SubmittedDocument>,
}

impl FraudCheckInput {
    pub fn for_submission(
        aadhaar: &str,
        data: &ApplicationData,
        documents: &[SubmittedDocument],
    ) -> Self {
        Self {
            aadhaar: Some(aadhaar.to_string()),
            name: Some(data.full_name.clone()),
            address: Some(ApplicantAddress::Structured(LocationAddress {
                district: Some(data.district.clone()),
                block: Some(data.block.clone()),
                panchayat: Some(data.panchayat.clone()),
                village: Some(data.village.clone()),
                extra: BTreeMap::new(),
            })),
            documents: documents.to_vec(),
        }
    }

    fn location(&self) -> Option<&LocationAddress> {
        self.address.as_ref().and_then(ApplicantAddress::location)
    }
}

/// Why a submission was flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudReason {
    SuspiciousAadhaar,
    MultipleApplications,
    GhostApplicant,
    DocumentQuality(String),
    HighRiskScore,
}

impl fmt::Display for FraudReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FraudReason::SuspiciousAadhaar => {
                f.write_str("Suspicious Aadhaar number pattern detected")
            }
            FraudReason::MultipleApplications => {
                f.write_str("Multiple applications detected for the same Aadhaar")
            }
            FraudReason::GhostApplicant => f.write_str("Ghost applicant pattern detected"),
            FraudReason::DocumentQuality(reason) => f.write_str(reason),
            FraudReason::HighRiskScore => f.write_str("High risk score"),
        }
    }
}

pub const INTERNAL_ERROR_REASON: &str = "Internal verification error";

/// Verdict handed back to the intake endpoint. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudCheckResult {
    pub is_fraud: bool,
    pub reasons: Vec<String>,
    pub risk_score: u8,
    pub message: String,
}

impl FraudCheckResult {
    fn from_reasons(reasons: Vec<FraudReason>, risk_score: u8) -> Self {
        let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        let is_fraud = !reasons.is_empty();
        let message = if is_fraud {
            format!("Fraud detected: {}", reasons.join(", "))
        } else {
            NO_FRAUD_MESSAGE.to_string()
        };

        Self {
            is_fraud,
            reasons,
            risk_score,
            message,
        }
    }

    /// Neutral result used when screening could not complete.
    pub fn screening_error(fallback_risk_score: u8) -> Self {
        Self {
            is_fraud: false,
            reasons: vec![INTERNAL_ERROR_REASON.to_string()],
            risk_score: fallback_risk_score,
            message: SCREENING_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Submission-time fraud heuristics backed by repository lookups.
pub struct FraudDetector<L: ?Sized> {
    lookup: Arc<L>,
    policy: FraudPolicy,
    inspector: Arc<dyn DocumentInspector>,
}

impl<L> FraudDetector<L>
where
    L: FraudLookup + ?Sized,
{
    pub fn new(lookup: Arc<L>, policy: FraudPolicy) -> Self {
        Self {
            lookup,
            policy,
            inspector: Arc::new(AcceptAllDocuments),
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn DocumentInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub async fn detect_fraud(&self, input: &FraudCheckInput) -> FraudCheckResult {
        match self.screen(input).await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    error = %err,
                    fallback_risk_score = self.policy.fallback_risk_score,
                    "fraud screening failed; submission continues without a fraud verdict"
                );
                FraudCheckResult::screening_error(self.policy.fallback_risk_score)
            }
        }
    }

    /// Submission-time score in [0, 100], independent of the stored application score.
    pub async fn calculate_risk_score(&self, input: &FraudCheckInput) -> u8 {
        match self.aggregate_risk(input).await {
            Ok(score) => score,
            Err(err) => {
                warn!(
                    error = %err,
                    fallback_risk_score = self.policy.fallback_risk_score,
                    "risk aggregation failed; using medium-risk default"
                );
                self.policy.fallback_risk_score
            }
        }
    }

    async fn screen(&self, input: &FraudCheckInput) -> Result<FraudCheckResult, RepositoryError> {
        let mut reasons = Vec::new();

        if is_duplicate_aadhaar(input, &self.policy) {
            reasons.push(FraudReason::SuspiciousAadhaar);
        }

        if self.has_duplicate_applications(input).await? {
            reasons.push(FraudReason::MultipleApplications);
        }

        if is_ghost_applicant(input, &self.policy) {
            reasons.push(FraudReason::GhostApplicant);
        }

        for document in &input.documents {
            if let DocumentQuality::Invalid { reason } = self.inspector.inspect(document) {
                reasons.push(FraudReason::DocumentQuality(reason));
                break;
            }
        }

        let flagged_by_patterns = !reasons.is_empty();
        let risk_score = self.calculate_risk_score(input).await;
        if risk_score > self.policy.high_risk_threshold && !flagged_by_patterns {
            reasons.push(FraudReason::HighRiskScore);
        }

        debug!(risk_score, reasons = reasons.len(), "fraud screening complete");
        Ok(FraudCheckResult::from_reasons(reasons, risk_score))
    }

    async fn has_duplicate_applications(
        &self,
        input: &FraudCheckInput,
    ) -> Result<bool, RepositoryError> {
        let Some(aadhaar) = input.aadhaar.as_deref() else {
            return Ok(false);
        };

        let Some(user) = self
            .bounded(
                "find_user_by_aadhaar",
                self.lookup.find_user_by_aadhaar(aadhaar),
            )
            .await?
        else {
            return Ok(false);
        };

        let active = self
            .bounded(
                "count_applications_by_user_and_statuses",
                self.lookup
                    .count_applications_by_user_and_statuses(&user.id, &self.policy.active_statuses),
            )
            .await?;

        Ok(active > self.policy.max_active_applications)
    }

    async fn aggregate_risk(&self, input: &FraudCheckInput) -> Result<u8, RepositoryError> {
        let weights = &self.policy.weights;
        let mut score: u32 = 0;
        let location = input.location();

        if location
            .and_then(|location| location.district.as_deref())
            .is_some_and(|district| self.policy.is_high_risk_district(district))
        {
            score = score.saturating_add(weights.high_risk_district);
        }

        if self.similar_name_count(input).await? > self.policy.similar_name_threshold {
            score = score.saturating_add(weights.similar_names);
        }

        if self.location_application_count(location).await?
            > self.policy.location_application_threshold
        {
            score = score.saturating_add(weights.crowded_location);
        }

        if is_duplicate_aadhaar(input, &self.policy) {
            score = score.saturating_add(weights.suspicious_aadhaar);
        }

        if is_ghost_applicant(input, &self.policy) {
            score = score.saturating_add(weights.ghost_applicant);
        }

        Ok(score.min(100) as u8)
    }

    async fn similar_name_count(&self, input: &FraudCheckInput) -> Result<u64, RepositoryError> {
        let Some(fragment) = input.name.as_deref().and_then(first_name_token) else {
            return Ok(0);
        };

        self.bounded(
            "count_users_by_name_fragment",
            self.lookup.count_users_by_name_fragment(fragment),
        )
        .await
    }

    async fn location_application_count(
        &self,
        location: Option<&LocationAddress>,
    ) -> Result<u64, RepositoryError> {
        let Some(location) = location else {
            return Ok(0);
        };
        let (Some(district), Some(block)) = (
            non_blank(location.district.as_deref()),
            non_blank(location.block.as_deref()),
        ) else {
            return Ok(0);
        };

        self.bounded(
            "count_applications_by_location",
            self.lookup.count_applications_by_location(
                district,
                block,
                non_blank(location.panchayat.as_deref()),
            ),
        )
        .await
    }

    async fn bounded<T, F>(&self, operation: &'static str, lookup: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        let limit = self.policy.lookup_timeout;
        match tokio::time::timeout(limit, lookup).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout {
                operation,
                after: limit,
            }),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
