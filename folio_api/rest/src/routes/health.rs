use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use folio_core_health_contracts::{HealthService, HealthStatus};
use serde::Serialize;

use super::error_with_details;

pub fn router(service: Arc<impl HealthService>) -> Router<()> {
    Router::new()
        .route("/api/health", routing::get(health))
        .with_state(service)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    ok: bool,
    mail_ready: bool,
}

async fn health(service: State<Arc<impl HealthService>>) -> Response {
    let HealthStatus { email } = service.get_status().await;

    match email {
        Ok(()) => Json(HealthResponse {
            ok: true,
            mail_ready: true,
        })
        .into_response(),
        Err(err) => error_with_details(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SMTP not verified",
            err.details,
        ),
    }
}
