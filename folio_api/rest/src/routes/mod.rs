use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiError;

pub mod contact;
pub mod health;
pub mod index;

pub fn error(code: StatusCode, error: &'static str) -> Response {
    (code, Json(ApiError::new(error))).into_response()
}

pub fn error_with_details(code: StatusCode, error: &'static str, details: String) -> Response {
    (code, Json(ApiError::new(error).with_details(details))).into_response()
}
