use crate::infra::{AppState, IntakeService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use samman::applications::{application_router, Application, FraudCheckInput, FraudCheckResult};
use samman::error::AppError;
use serde_json::json;
use std::sync::Arc;

pub(crate) const VERIFICATION_QUEUE_LIMIT: usize = 50;

pub(crate) fn with_application_routes(service: Arc<IntakeService>) -> axum::Router {
    application_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/fraud-checks",
            axum::routing::post(fraud_check_endpoint),
        )
        .route(
            "/api/v1/verification-queue",
            axum::routing::get(verification_queue_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Dry-run screening of an arbitrary input. Nothing is persisted.
pub(crate) async fn fraud_check_endpoint(
    Extension(state): Extension<AppState>,
    body: String,
) -> Result<Json<FraudCheckResult>, AppError> {
    let input: FraudCheckInput = serde_json::from_str(&body)?;
    Ok(Json(state.service.detector().detect_fraud(&input).await))
}

pub(crate) async fn verification_queue_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Application>>, AppError> {
    let queue = state
        .service
        .verification_queue(VERIFICATION_QUEUE_LIMIT)
        .await?;
    Ok(Json(queue))
}
