use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::applications::domain::{
    Application, ApplicationData, ApplicationDocument, ApplicationId, ApplicationStatus,
    ApplicationSubmission, DocumentType, NewApplicant, ResidentialAddress, SubmittedDocument,
    UserId, UserRecord, VerificationEntry,
};
use crate::applications::fraud::{ApplicantAddress, FraudCheckInput, FraudPolicy, LocationAddress};
use crate::applications::repository::{ApplicationRepository, FraudLookup, RepositoryError};
use crate::applications::{application_router, BenefitApplicationService};

pub(super) const CLEAN_AADHAAR: &str = "123456789012";
pub(super) const PATTERN_AADHAAR: &str = "123456789010";

pub(super) fn application_data() -> ApplicationData {
    ApplicationData {
        full_name: "Suresh Oraon".to_string(),
        age: 42,
        district: "Ranchi".to_string(),
        block: "Bero".to_string(),
        panchayat: "Itki".to_string(),
        village: "Hutup".to_string(),
        monthly_income: 8_000,
        dependents: 2,
        bank_account: "30912874561".to_string(),
        ifsc_code: "SBIN0001234".to_string(),
        bank_name: "State Bank of India".to_string(),
    }
}

pub(super) fn submitted_documents() -> Vec<SubmittedDocument> {
    vec![
        SubmittedDocument {
            doc_type: DocumentType::Aadhaar,
            file_url: "https://uploads.local/aadhaar.jpg".to_string(),
            size_bytes: Some(40_960),
        },
        SubmittedDocument {
            doc_type: DocumentType::IncomeCertificate,
            file_url: "https://uploads.local/income.png".to_string(),
            size_bytes: None,
        },
    ]
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        application_data: application_data(),
        documents: Some(submitted_documents()),
        location_coordinates: None,
    }
}

pub(super) fn new_applicant(aadhaar: &str, name: &str) -> NewApplicant {
    NewApplicant {
        aadhaar_number: aadhaar.to_string(),
        name: name.to_string(),
        address: Some(ResidentialAddress {
            district: "Ranchi".to_string(),
            block: "Bero".to_string(),
            panchayat: "Itki".to_string(),
        }),
    }
}

/// Fraud input matching the clean submission scenario.
pub(super) fn clean_input() -> FraudCheckInput {
    FraudCheckInput {
        aadhaar: Some(CLEAN_AADHAAR.to_string()),
        name: Some("Suresh Oraon".to_string()),
        address: Some(ApplicantAddress::Structured(LocationAddress {
            district: Some("Ranchi".to_string()),
            block: Some("Bero".to_string()),
            panchayat: Some("Itki".to_string()),
            village: Some("Hutup".to_string()),
            ..LocationAddress::default()
        })),
        documents: submitted_documents(),
    }
}

pub(super) fn in_district(mut input: FraudCheckInput, district: &str) -> FraudCheckInput {
    if let Some(ApplicantAddress::Structured(location)) = input.address.as_mut() {
        location.district = Some(district.to_string());
    }
    input
}

pub(super) fn fixed_time(hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Application with `unverified` + `verified` documents and the given history statuses.
pub(super) fn scored_application(
    monthly_income: u64,
    unverified: usize,
    verified: usize,
    history: &[ApplicationStatus],
) -> Application {
    let mut data = application_data();
    data.monthly_income = monthly_income;

    let documents = (0..unverified)
        .map(|_| false)
        .chain((0..verified).map(|_| true))
        .map(|verified| ApplicationDocument {
            doc_type: DocumentType::BankStatement,
            file_url: "https://uploads.local/statement.png".to_string(),
            verified,
            verification_notes: None,
        })
        .collect();

    let mut application = Application::new(
        ApplicationId("app-test".to_string()),
        UserId("usr-test".to_string()),
        data,
        documents,
        fixed_time(9),
    );
    application.verification_history = history
        .iter()
        .map(|status| VerificationEntry {
            status: *status,
            notes: "reviewed".to_string(),
            verified_by: Some("admin-7".to_string()),
            timestamp: fixed_time(10),
        })
        .collect();
    application
}

/// Canned answers for the four fraud lookups, recording every call.
#[derive(Default)]
pub(super) struct StubLookup {
    pub(super) user: Option<UserRecord>,
    pub(super) active_applications: u64,
    pub(super) similar_names: u64,
    pub(super) location_applications: u64,
    pub(super) fail_name_counts: bool,
    pub(super) calls: Mutex<Vec<String>>,
}

impl StubLookup {
    pub(super) fn with_counts(similar_names: u64, location_applications: u64) -> Self {
        Self {
            similar_names,
            location_applications,
            ..Self::default()
        }
    }

    pub(super) fn with_active_applications(active_applications: u64) -> Self {
        Self {
            user: Some(UserRecord {
                id: UserId("usr-dup".to_string()),
                aadhaar_number: CLEAN_AADHAAR.to_string(),
                name: "Suresh Oraon".to_string(),
                address: None,
            }),
            active_applications,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

#[async_trait]
impl FraudLookup for StubLookup {
    async fn find_user_by_aadhaar(
        &self,
        aadhaar: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        self.record(format!("user:{aadhaar}"));
        Ok(self.user.clone())
    }

    async fn count_applications_by_user_and_statuses(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<u64, RepositoryError> {
        let labels: Vec<&str> = statuses.iter().map(ApplicationStatus::label).collect();
        self.record(format!("active:{}:{}", user_id, labels.join("|")));
        Ok(self.active_applications)
    }

    async fn count_users_by_name_fragment(&self, fragment: &str) -> Result<u64, RepositoryError> {
        self.record(format!("names:{fragment}"));
        if self.fail_name_counts {
            return Err(RepositoryError::Unavailable("name index offline".to_string()));
        }
        Ok(self.similar_names)
    }

    async fn count_applications_by_location(
        &self,
        district: &str,
        block: &str,
        panchayat: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        self.record(format!(
            "location:{district}/{block}/{}",
            panchayat.unwrap_or("-")
        ));
        Ok(self.location_applications)
    }
}

/// Every lookup fails.
pub(super) struct FailingLookup;

#[async_trait]
impl FraudLookup for FailingLookup {
    async fn find_user_by_aadhaar(
        &self,
        _aadhaar: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn count_applications_by_user_and_statuses(
        &self,
        _user_id: &UserId,
        _statuses: &[ApplicationStatus],
    ) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn count_users_by_name_fragment(&self, _fragment: &str) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn count_applications_by_location(
        &self,
        _district: &str,
        _block: &str,
        _panchayat: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Every lookup hangs well past any reasonable timeout.
pub(super) struct StalledLookup;

impl StalledLookup {
    async fn stall() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

#[async_trait]
impl FraudLookup for StalledLookup {
    async fn find_user_by_aadhaar(
        &self,
        _aadhaar: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        Self::stall().await;
        Ok(None)
    }

    async fn count_applications_by_user_and_statuses(
        &self,
        _user_id: &UserId,
        _statuses: &[ApplicationStatus],
    ) -> Result<u64, RepositoryError> {
        Self::stall().await;
        Ok(0)
    }

    async fn count_users_by_name_fragment(&self, _fragment: &str) -> Result<u64, RepositoryError> {
        Self::stall().await;
        Ok(0)
    }

    async fn count_applications_by_location(
        &self,
        _district: &str,
        _block: &str,
        _panchayat: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        Self::stall().await;
        Ok(0)
    }
}

pub(super) fn fast_timeout_policy() -> FraudPolicy {
    FraudPolicy {
        lookup_timeout: Duration::from_millis(20),
        ..FraudPolicy::default()
    }
}

/// In-memory store backing the service tests. `fail_counts` makes the fraud count
/// queries fail while ordinary reads and writes keep working.
#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) users: Mutex<HashMap<UserId, UserRecord>>,
    pub(super) applications: Mutex<HashMap<ApplicationId, Application>>,
    pub(super) fail_counts: AtomicBool,
}

impl MemoryRepository {
    pub(super) fn stored(&self) -> Vec<Application> {
        self.applications
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn ensure_counts_available(&self) -> Result<(), RepositoryError> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("replica lagging".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryRepository {
    async fn register_user(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.users.lock().expect("repository mutex poisoned");
        if guard.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|application| &application.user_id == user_id && application.status.is_active())
            .cloned())
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| &application.user_id == user_id)
            .max_by_key(|application| (application.submission_date, application.id.0.clone()))
            .cloned())
    }

    async fn pending(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| application.status == ApplicationStatus::Pending)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FraudLookup for MemoryRepository {
    async fn find_user_by_aadhaar(
        &self,
        aadhaar: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.users.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|user| user.aadhaar_number == aadhaar)
            .cloned())
    }

    async fn count_applications_by_user_and_statuses(
        &self,
        user_id: &UserId,
        statuses: &[ApplicationStatus],
    ) -> Result<u64, RepositoryError> {
        self.ensure_counts_available()?;
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| {
                &application.user_id == user_id && statuses.contains(&application.status)
            })
            .count() as u64)
    }

    async fn count_users_by_name_fragment(&self, fragment: &str) -> Result<u64, RepositoryError> {
        self.ensure_counts_available()?;
        let needle = fragment.to_lowercase();
        let guard = self.users.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|user| user.name.to_lowercase().contains(&needle))
            .count() as u64)
    }

    async fn count_applications_by_location(
        &self,
        district: &str,
        block: &str,
        panchayat: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        self.ensure_counts_available()?;
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| {
                let data = &application.application_data;
                data.district == district
                    && data.block == block
                    && panchayat.map_or(true, |panchayat| data.panchayat == panchayat)
            })
            .count() as u64)
    }
}

pub(super) fn build_service() -> (
    BenefitApplicationService<MemoryRepository>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = BenefitApplicationService::new(repository.clone(), FraudPolicy::default());
    (service, repository)
}

pub(super) fn router_with_service(
    service: BenefitApplicationService<MemoryRepository>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
