use std::time::Duration;

use super::super::domain::{ApplicationStatus, AADHAAR_DIGITS};

pub const DEFAULT_HIGH_RISK_DISTRICTS: [&str; 4] = ["Bokaro", "Palamu", "Pakur", "Godda"];
pub const DEFAULT_GHOST_NAMES: [&str; 5] = ["JAN", "RAM", "RAJ", "KUMAR", "DEVI"];
pub const DEFAULT_GHOST_ADDRESS_TOKENS: [&str; 3] = ["NA", "NOT AVAILABLE", "TEMPORARY"];

/// Shape of Aadhaar numbers produced by a known fake-ID generator: a fixed run of
/// digits ending in one specific digit. Not a checksum validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AadhaarPattern {
    pub length: usize,
    pub trailing_digit: char,
}

impl AadhaarPattern {
    pub fn matches(&self, aadhaar: &str) -> bool {
        aadhaar.len() == self.length
            && aadhaar.bytes().all(|byte| byte.is_ascii_digit())
            && aadhaar.ends_with(self.trailing_digit)
    }
}

impl Default for AadhaarPattern {
    fn default() -> Self {
        Self {
            length: AADHAAR_DIGITS,
            trailing_digit: '0',
        }
    }
}

/// Points contributed by each submission-time signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalWeights {
    pub high_risk_district: u32,
    pub similar_names: u32,
    pub crowded_location: u32,
    pub suspicious_aadhaar: u32,
    pub ghost_applicant: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            high_risk_district: 20,
            similar_names: 15,
            crowded_location: 10,
            suspicious_aadhaar: 40,
            ghost_applicant: 40,
        }
    }
}

/// Lists, thresholds and weights consumed by [`FraudDetector`](super::FraudDetector).
#[derive(Debug, Clone, PartialEq)]
pub struct FraudPolicy {
    pub aadhaar_pattern: AadhaarPattern,
    /// Upper-case tokens; matched as substrings of the upper-cased applicant name.
    pub ghost_names: Vec<String>,
    /// Upper-case tokens; matched as substrings of the upper-cased flattened address.
    pub ghost_address_tokens: Vec<String>,
    /// Exact, case-sensitive district names.
    pub high_risk_districts: Vec<String>,
    pub active_statuses: Vec<ApplicationStatus>,
    /// More active applications than this for one Aadhaar is a duplicate.
    pub max_active_applications: u64,
    pub similar_name_threshold: u64,
    pub location_application_threshold: u64,
    pub weights: SignalWeights,
    /// Scores strictly above this flag an otherwise clean submission.
    pub high_risk_threshold: u8,
    pub fallback_risk_score: u8,
    pub lookup_timeout: Duration,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            aadhaar_pattern: AadhaarPattern::default(),
            ghost_names: owned(&DEFAULT_GHOST_NAMES),
            ghost_address_tokens: owned(&DEFAULT_GHOST_ADDRESS_TOKENS),
            high_risk_districts: owned(&DEFAULT_HIGH_RISK_DISTRICTS),
            active_statuses: ApplicationStatus::ACTIVE.to_vec(),
            max_active_applications: 1,
            similar_name_threshold: 3,
            location_application_threshold: 100,
            weights: SignalWeights::default(),
            high_risk_threshold: 80,
            fallback_risk_score: 50,
            lookup_timeout: Duration::from_secs(2),
        }
    }
}

impl FraudPolicy {
    pub fn is_high_risk_district(&self, district: &str) -> bool {
        self.high_risk_districts
            .iter()
            .any(|candidate| candidate == district)
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
