use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use folio_core_contact_contracts::{ContactSendMessageError, ContactService};
use serde::Serialize;
use tracing::error;

use super::error_with_details;
use crate::models::{
    contact::{parse_submission, ApiValidationIssue},
    ApiError,
};

pub fn router(service: Arc<impl ContactService>) -> Router<()> {
    Router::new()
        .route("/api/contact", routing::post(send_message))
        .with_state(service)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageResponse {
    ok: bool,
    message_id: String,
}

async fn send_message(
    service: State<Arc<impl ContactService>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response();
        }
        Err(rejection) => {
            return validation_failed(vec![ApiValidationIssue::invalid_body(
                rejection.body_text(),
            )]);
        }
    };

    let input = match parse_submission(body) {
        Ok(input) => input,
        Err(issue) => return validation_failed(vec![issue]),
    };

    match service.send_message(input).await {
        Ok(message_id) => Json(SendMessageResponse {
            ok: true,
            message_id: message_id.into_inner(),
        })
        .into_response(),
        Err(ContactSendMessageError::Validation(issues)) => {
            validation_failed(issues.iter().map(Into::into).collect())
        }
        Err(ContactSendMessageError::Delivery(details)) => email_failed(details),
        Err(ContactSendMessageError::Other(err)) => {
            error!("Failed to compose contact message: {err}");
            email_failed(err.to_string())
        }
    }
}

fn validation_failed(issues: Vec<ApiValidationIssue>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("Validation failed").with_issues(issues)),
    )
        .into_response()
}

fn email_failed(details: String) -> Response {
    error_with_details(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Email failed to send",
        details,
    )
}
