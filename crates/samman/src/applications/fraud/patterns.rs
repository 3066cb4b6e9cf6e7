//! Pure predicates shared by the fraud verdict and the submission risk score, so the
//! two can never disagree on whether a pattern matched.

use super::policy::FraudPolicy;
use super::FraudCheckInput;

pub fn is_duplicate_aadhaar(input: &FraudCheckInput, policy: &FraudPolicy) -> bool {
    input
        .aadhaar
        .as_deref()
        .map(|aadhaar| policy.aadhaar_pattern.matches(aadhaar))
        .unwrap_or(false)
}

pub fn is_ghost_applicant(input: &FraudCheckInput, policy: &FraudPolicy) -> bool {
    let name_matches = input
        .name
        .as_deref()
        .map(|name| contains_any(name, &policy.ghost_names))
        .unwrap_or(false);
    if name_matches {
        return true;
    }

    input
        .address
        .as_ref()
        .map(|address| contains_any(&address.flatten(), &policy.ghost_address_tokens))
        .unwrap_or(false)
}

/// First whitespace-delimited token of the applicant name, if any.
pub fn first_name_token(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

fn contains_any(haystack: &str, tokens: &[String]) -> bool {
    let haystack = haystack.to_uppercase();
    tokens
        .iter()
        .filter(|token| !token.is_empty())
        .any(|token| haystack.contains(&token.to_uppercase()))
}
