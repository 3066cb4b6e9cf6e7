use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Application, ApplicationId, ApplicationStatus, UserId, UserRecord};

/// Read queries the fraud detector issues against users and applications.
#[async_trait]
pub trait FraudLookup: Send + Sync {
    async fn find_user_by_aadhaar(&self, aadhaar: &str)
        -> Result<Option<UserRecord>, RepositoryError>;

    async fn count_applications_by_user_and_statuses(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<u64, RepositoryError>;

    /// Users whose name contains `fragment`, ignoring case.
    async fn count_users_by_name_fragment(&self, fragment: &str) -> Result<u64, RepositoryError>;

    /// Applications filed from the same district and block, narrowed by panchayat when given.
    async fn count_applications_by_location(
        &self,
        district: &str,
        block: &str,
        panchayat: Option<&str>,
    ) -> Result<u64, RepositoryError>;
}

/// Storage abstraction so the service can be exercised without a database.
///
/// Callers run [`ApplicationRiskScorer::before_save`](super::risk::ApplicationRiskScorer::before_save)
/// on every application handed to `insert` or `update`.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn register_user(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    async fn update(&self, application: Application) -> Result<(), RepositoryError>;
    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Most recently submitted application for the user.
    async fn latest_for_user(&self, user_id: &UserId)
        -> Result<Option<Application>, RepositoryError>;
    async fn pending(&self) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Public status of an applicant's most recent application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub submission_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<&Application> for ApplicationStatusView {
    fn from(application: &Application) -> Self {
        Self {
            application_id: application.id.clone(),
            status: application.status.label(),
            submission_date: application.submission_date,
            last_updated: application.last_updated(),
        }
    }
}
