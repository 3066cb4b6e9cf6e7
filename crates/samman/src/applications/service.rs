use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationDocument, ApplicationId, ApplicationSubmission,
    DocumentReview, DocumentType, NewApplicant, StatusChange, SubmittedDocument, UserId,
    UserRecord, ValidationError, VerificationEntry,
};
use super::fraud::{DocumentInspector, FraudCheckInput, FraudDetector, FraudPolicy};
use super::repository::{
    ApplicationRepository, ApplicationStatusView, FraudLookup, RepositoryError,
};
use super::risk::ApplicationRiskScorer;

/// Facade composing the repository, the fraud detector and the stored-score hook.
pub struct BenefitApplicationService<R> {
    repository: Arc<R>,
    detector: FraudDetector<R>,
    scorer: ApplicationRiskScorer,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("usr-{id:06}"))
}

impl<R> BenefitApplicationService<R>
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    pub fn new(repository: Arc<R>, policy: FraudPolicy) -> Self {
        let detector = FraudDetector::new(repository.clone(), policy);
        Self::with_parts(repository, detector, ApplicationRiskScorer::default())
    }

    pub fn with_parts(
        repository: Arc<R>,
        detector: FraudDetector<R>,
        scorer: ApplicationRiskScorer,
    ) -> Self {
        Self {
            repository,
            detector,
            scorer,
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn DocumentInspector>) -> Self {
        self.detector = self.detector.with_inspector(inspector);
        self
    }

    pub fn detector(&self) -> &FraudDetector<R> {
        &self.detector
    }

    pub async fn register_applicant(
        &self,
        applicant: NewApplicant,
    ) -> Result<UserRecord, ApplicationServiceError> {
        applicant.validate()?;

        if self
            .repository
            .find_user_by_aadhaar(&applicant.aadhaar_number)
            .await?
            .is_some()
        {
            return Err(RepositoryError::Conflict.into());
        }

        let user = UserRecord {
            id: next_user_id(),
            aadhaar_number: applicant.aadhaar_number,
            name: applicant.name.trim().to_string(),
            address: applicant.address,
        };
        Ok(self.repository.register_user(user).await?)
    }

    /// Screen and persist a new application for the applicant holding `aadhaar`.
    pub async fn submit(
        &self,
        aadhaar: &str,
        submission: ApplicationSubmission,
    ) -> Result<Application, ApplicationServiceError> {
        submission.application_data.validate()?;

        let applicant = self.applicant(aadhaar).await?;

        if let Some(existing) = self.repository.find_active_for_user(&applicant.id).await? {
            return Err(ApplicationServiceError::ActiveApplicationExists(existing.id));
        }

        if let Some(documents) = &submission.documents {
            let input = FraudCheckInput::for_submission(
                &applicant.aadhaar_number,
                &submission.application_data,
                documents,
            );
            let verdict = self.detector.detect_fraud(&input).await;
            if verdict.is_fraud {
                warn!(
                    user_id = %applicant.id,
                    risk_score = verdict.risk_score,
                    reasons = ?verdict.reasons,
                    "submission rejected by fraud screening"
                );
                return Err(ApplicationServiceError::FraudDetected {
                    reasons: verdict.reasons,
                    risk_score: verdict.risk_score,
                });
            }
        }

        let now = Utc::now();
        let documents = submission
            .documents
            .unwrap_or_default()
            .into_iter()
            .map(ApplicationDocument::from)
            .collect();
        let mut application = Application::new(
            next_application_id(),
            applicant.id,
            submission.application_data,
            documents,
            now,
        );
        application.location_coordinates = submission.location_coordinates;

        self.scorer.before_save(&mut application, now);
        let stored = self.repository.insert(application).await?;

        info!(
            application_id = %stored.id,
            risk_score = stored.risk_score(),
            "benefit application accepted"
        );
        Ok(stored)
    }

    /// Add or replace one of the applicant's documents while the application is open.
    pub async fn upload_document(
        &self,
        aadhaar: &str,
        application_id: &ApplicationId,
        upload: SubmittedDocument,
    ) -> Result<Application, ApplicationServiceError> {
        let applicant = self.applicant(aadhaar).await?;
        let mut application = self.fetch_existing(application_id).await?;
        if application.user_id != applicant.id {
            return Err(RepositoryError::NotFound.into());
        }

        if !application.status.accepts_document_changes() {
            return Err(ApplicationServiceError::NotModifiable {
                application_id: application.id,
                status: application.status.label(),
            });
        }

        match application
            .documents
            .iter_mut()
            .find(|document| document.doc_type == upload.doc_type)
        {
            Some(existing) => {
                existing.file_url = upload.file_url;
                existing.verified = false;
            }
            None => application.documents.push(ApplicationDocument::from(upload)),
        }

        self.save(application).await
    }

    /// Record an administrative status transition.
    pub async fn update_status(
        &self,
        application_id: &ApplicationId,
        change: StatusChange,
    ) -> Result<Application, ApplicationServiceError> {
        if change.notes.trim().is_empty() {
            return Err(ValidationError::MissingNotes.into());
        }

        let mut application = self.fetch_existing(application_id).await?;
        let previous = application.status;
        application.status = change.status;
        application.verification_history.push(VerificationEntry {
            status: change.status,
            notes: change.notes,
            verified_by: change.verified_by,
            timestamp: Utc::now(),
        });

        let saved = self.save(application).await?;
        info!(
            application_id = %saved.id,
            from = previous.label(),
            to = saved.status.label(),
            risk_score = saved.risk_score(),
            "application status updated"
        );
        Ok(saved)
    }

    /// Mark a single document as verified (or not) after review.
    pub async fn verify_document(
        &self,
        application_id: &ApplicationId,
        doc_type: DocumentType,
        review: DocumentReview,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self.fetch_existing(application_id).await?;
        let document = application
            .documents
            .iter_mut()
            .find(|document| document.doc_type == doc_type)
            .ok_or(ApplicationServiceError::DocumentNotFound(doc_type))?;
        document.verified = review.verified;
        document.verification_notes = review.notes;

        self.save(application).await
    }

    pub async fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        self.fetch_existing(application_id).await
    }

    /// Status of the applicant's most recent application.
    pub async fn status_by_aadhaar(
        &self,
        aadhaar: &str,
    ) -> Result<ApplicationStatusView, ApplicationServiceError> {
        let applicant = self.applicant(aadhaar).await?;
        let latest = self
            .repository
            .latest_for_user(&applicant.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(ApplicationStatusView::from(&latest))
    }

    /// Pending applications, riskiest first, oldest first among equals.
    pub async fn verification_queue(
        &self,
        limit: usize,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let mut pending = self.repository.pending().await?;
        pending.sort_by(|left, right| {
            right
                .risk_score()
                .cmp(&left.risk_score())
                .then(left.submission_date.cmp(&right.submission_date))
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn applicant(&self, aadhaar: &str) -> Result<UserRecord, ApplicationServiceError> {
        self.repository
            .find_user_by_aadhaar(aadhaar)
            .await?
            .ok_or(ApplicationServiceError::UnknownApplicant)
    }

    async fn fetch_existing(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        Ok(self
            .repository
            .fetch(application_id)
            .await?
            .ok_or(RepositoryError::NotFound)?)
    }

    async fn save(
        &self,
        mut application: Application,
    ) -> Result<Application, ApplicationServiceError> {
        self.scorer.before_save(&mut application, Utc::now());
        self.repository.update(application.clone()).await?;
        Ok(application)
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no applicant is registered for this aadhaar number")]
    UnknownApplicant,
    #[error("applicant already has an active application ({0})")]
    ActiveApplicationExists(ApplicationId),
    #[error("fraud detected in application: {}", .reasons.join(", "))]
    FraudDetected { reasons: Vec<String>, risk_score: u8 },
    #[error("application {application_id} cannot be modified while {status}")]
    NotModifiable {
        application_id: ApplicationId,
        status: &'static str,
    },
    #[error("application has no {0} document")]
    DocumentNotFound(DocumentType),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
