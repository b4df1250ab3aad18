use serde::Serialize;

use self::contact::ApiValidationIssue;

pub mod contact;

/// The envelope of every unsuccessful response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub ok: bool,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<ApiValidationIssue>>,
}

impl ApiError {
    pub fn new(error: &'static str) -> Self {
        Self {
            ok: false,
            error,
            details: None,
            issues: None,
        }
    }

    pub fn with_details(self, details: String) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    pub fn with_issues(self, issues: Vec<ApiValidationIssue>) -> Self {
        Self {
            issues: Some(issues),
            ..self
        }
    }
}
