use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use samman::applications::fraud::FormatDocumentInspector;
use samman::applications::{
    Application, ApplicationId, ApplicationRepository, ApplicationStatus,
    BenefitApplicationService, FraudCheckInput, FraudLookup, RepositoryError, UserId, UserRecord,
};
use samman::config::ScreeningConfig;
use samman::error::AppError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) type IntakeService = BenefitApplicationService<InMemoryBenefitRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) service: Arc<IntakeService>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBenefitRepository {
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
    applications: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

#[async_trait]
impl ApplicationRepository for InMemoryBenefitRepository {
    async fn register_user(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.users.lock().expect("user mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.aadhaar_number == user.aadhaar_number)
        {
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
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
            .max_by(|left, right| {
                left.submission_date
                    .cmp(&right.submission_date)
                    .then_with(|| left.id.0.cmp(&right.id.0))
            })
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
impl FraudLookup for InMemoryBenefitRepository {
    async fn find_user_by_aadhaar(
        &self,
        aadhaar: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.users.lock().expect("user mutex poisoned");
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
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| {
                &application.user_id == user_id && statuses.contains(&application.status)
            })
            .count() as u64)
    }

    async fn count_users_by_name_fragment(&self, fragment: &str) -> Result<u64, RepositoryError> {
        let needle = fragment.to_lowercase();
        let guard = self.users.lock().expect("user mutex poisoned");
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

/// Intake service over a fresh in-memory store, honouring the screening settings.
pub(crate) fn build_intake_service(screening: &ScreeningConfig) -> IntakeService {
    let repository = Arc::new(InMemoryBenefitRepository::default());
    let service = BenefitApplicationService::new(repository, screening.fraud_policy());
    if screening.strict_documents {
        service.with_inspector(Arc::new(FormatDocumentInspector::default()))
    } else {
        service
    }
}

pub(crate) fn read_fraud_input(path: &Path) -> Result<FraudCheckInput, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
