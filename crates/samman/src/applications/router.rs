use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationSubmission, NewApplicant};
use super::repository::{ApplicationRepository, FraudLookup, RepositoryError};
use super::service::{ApplicationServiceError, BenefitApplicationService};

/// Intake request: the applicant's Aadhaar number plus the application form.
#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub aadhaar_number: String,
    #[serde(flatten)]
    pub submission: ApplicationSubmission,
}

/// Router builder exposing the intake endpoints that call into fraud screening.
pub fn application_router<R>(service: Arc<BenefitApplicationService<R>>) -> Router
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    Router::new()
        .route("/api/v1/applicants", post(register_handler::<R>))
        .route("/api/v1/applications", post(submit_handler::<R>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R>),
        )
        .route(
            "/api/v1/applications/status/:aadhaar_number",
            get(status_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<BenefitApplicationService<R>>>,
    axum::Json(applicant): axum::Json<NewApplicant>,
) -> Response
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    match service.register_applicant(applicant).await {
        Ok(user) => (StatusCode::CREATED, axum::Json(user)).into_response(),
        Err(ApplicationServiceError::Repository(RepositoryError::Conflict)) => error_response(
            StatusCode::CONFLICT,
            "an applicant with this aadhaar number is already registered",
        ),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<BenefitApplicationService<R>>>,
    axum::Json(request): axum::Json<SubmitApplicationRequest>,
) -> Response
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    match service
        .submit(&request.aadhaar_number, request.submission)
        .await
    {
        Ok(application) => {
            let payload = json!({
                "message": "Application submitted successfully",
                "application": application,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(ApplicationServiceError::FraudDetected { reasons, .. }) => {
            let payload = json!({
                "message": "Fraud detected in application",
                "reasons": reasons,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(ApplicationServiceError::ActiveApplicationExists(application_id)) => {
            let payload = json!({
                "message": "You already have an active application",
                "application_id": application_id,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn application_handler<R>(
    State(service): State<Arc<BenefitApplicationService<R>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    match service.get(&ApplicationId(application_id)).await {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<BenefitApplicationService<R>>>,
    Path(aadhaar_number): Path<String>,
) -> Response
where
    R: ApplicationRepository + FraudLookup + 'static,
{
    match service.status_by_aadhaar(&aadhaar_number).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(ApplicationServiceError::UnknownApplicant)
        | Err(ApplicationServiceError::Repository(RepositoryError::NotFound)) => error_response(
            StatusCode::NOT_FOUND,
            "No applications found for this Aadhaar number",
        ),
        Err(other) => service_error_response(other),
    }
}

fn service_error_response(error: ApplicationServiceError) -> Response {
    let status = match &error {
        ApplicationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationServiceError::UnknownApplicant
        | ApplicationServiceError::DocumentNotFound(_)
        | ApplicationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ApplicationServiceError::FraudDetected { .. }
        | ApplicationServiceError::NotModifiable { .. } => StatusCode::BAD_REQUEST,
        ApplicationServiceError::ActiveApplicationExists(_)
        | ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
