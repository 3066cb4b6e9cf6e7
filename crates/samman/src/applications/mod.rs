//! Benefit application intake, stored risk scoring, and submission-time fraud screening.

pub mod domain;
pub mod fraud;
pub mod repository;
pub mod risk;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationData, ApplicationDocument, ApplicationId, ApplicationStatus,
    ApplicationSubmission, DocumentReview, DocumentType, LocationCoordinates, NewApplicant,
    ResidentialAddress, StatusChange, SubmittedDocument, UserId, UserRecord, ValidationError,
    VerificationEntry,
};
pub use fraud::{
    ApplicantAddress, FraudCheckInput, FraudCheckResult, FraudDetector, FraudPolicy,
    LocationAddress,
};
pub use repository::{
    ApplicationRepository, ApplicationStatusView, FraudLookup, RepositoryError,
};
pub use risk::{ApplicationRiskScorer, RiskScoringPolicy};
pub use router::{application_router, SubmitApplicationRequest};
pub use service::{ApplicationServiceError, BenefitApplicationService};
