use folio_models::contact::{
    ContactSubmissionInput, FieldInput, ValidationIssue, ValidationIssueKind, ValueKind,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// One violation in a `400 Validation failed` response, shaped like a zod
/// issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiValidationIssue {
    pub code: &'static str,
    pub path: Vec<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<usize>,
    /// Kind of value a size bound applies to.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    /// Name of the string format that did not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<&'static str>,
}

impl ApiValidationIssue {
    /// The request body could not be read as json at all.
    pub fn invalid_body(message: String) -> Self {
        Self {
            path: Vec::new(),
            expected: Some("object"),
            ..Self::base("", "invalid_type", message)
        }
    }

    fn base(field: &'static str, code: &'static str, message: String) -> Self {
        Self {
            code,
            path: vec![field],
            message,
            expected: None,
            received: None,
            minimum: None,
            maximum: None,
            kind: None,
            inclusive: None,
            exact: None,
            validation: None,
        }
    }

    fn string_bound(field: &'static str, code: &'static str, message: String) -> Self {
        Self {
            kind: Some("string"),
            inclusive: Some(true),
            exact: Some(false),
            ..Self::base(field, code, message)
        }
    }
}

impl From<&ValidationIssue> for ApiValidationIssue {
    fn from(issue: &ValidationIssue) -> Self {
        let field = issue.field.as_str();
        match issue.kind {
            ValidationIssueKind::Required => Self {
                expected: Some("string"),
                received: Some("undefined"),
                ..Self::base(field, "invalid_type", "Required".into())
            },
            ValidationIssueKind::InvalidType { received } => Self {
                expected: Some("string"),
                received: Some(received.as_str()),
                ..Self::base(
                    field,
                    "invalid_type",
                    format!("Expected string, received {}", received.as_str()),
                )
            },
            ValidationIssueKind::TooShort { minimum } => Self {
                minimum: Some(minimum),
                ..Self::string_bound(
                    field,
                    "too_small",
                    format!("String must contain at least {minimum} character(s)"),
                )
            },
            ValidationIssueKind::TooLong { maximum } => Self {
                maximum: Some(maximum),
                ..Self::string_bound(
                    field,
                    "too_big",
                    format!("String must contain at most {maximum} character(s)"),
                )
            },
            ValidationIssueKind::InvalidEmail => Self {
                validation: Some("email"),
                ..Self::base(field, "invalid_string", "Invalid email".into())
            },
        }
    }
}

/// Split a json request body into the fields of a contact submission.
pub fn parse_submission(body: Value) -> Result<ContactSubmissionInput, ApiValidationIssue> {
    let Value::Object(mut object) = body else {
        let received = json_type(&body);
        return Err(ApiValidationIssue {
            received: Some(received),
            ..ApiValidationIssue::invalid_body(format!("Expected object, received {received}"))
        });
    };

    let mut field = |name: &str| field_input(&mut object, name);

    Ok(ContactSubmissionInput {
        name: field("name"),
        email: field("email"),
        subject: field("subject"),
        phone: field("phone"),
        message: field("message"),
    })
}

fn field_input(object: &mut Map<String, Value>, name: &str) -> FieldInput {
    let kind = match object.remove(name) {
        None => return FieldInput::Missing,
        Some(Value::String(text)) => return FieldInput::Text(text),
        Some(Value::Null) => ValueKind::Null,
        Some(Value::Bool(_)) => ValueKind::Boolean,
        Some(Value::Number(_)) => ValueKind::Number,
        Some(Value::Array(_)) => ValueKind::Array,
        Some(Value::Object(_)) => ValueKind::Object,
    };
    FieldInput::Other(kind)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use folio_models::contact::ContactField;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_all_fields() {
        let result = parse_submission(json!({
            "name": "Jane",
            "email": "jane@x.com",
            "subject": "Hi",
            "message": "Hello there",
            "phone": null,
            "unknown": 42,
        }))
        .unwrap();

        assert_eq!(
            result,
            ContactSubmissionInput {
                name: "Jane".into(),
                email: "jane@x.com".into(),
                subject: "Hi".into(),
                phone: FieldInput::Other(ValueKind::Null),
                message: "Hello there".into(),
            }
        );
    }

    #[test]
    fn parse_missing_and_mistyped_fields() {
        let result = parse_submission(json!({ "name": 7, "email": ["a@b.com"] })).unwrap();

        assert_eq!(
            result,
            ContactSubmissionInput {
                name: FieldInput::Other(ValueKind::Number),
                email: FieldInput::Other(ValueKind::Array),
                ..Default::default()
            }
        );
    }

    #[test]
    fn parse_non_object() {
        let result = parse_submission(json!("hello"));

        let issue = result.unwrap_err();
        assert_eq!(issue.path, Vec::<&str>::new());
        assert_eq!(issue.code, "invalid_type");
        assert_eq!(issue.message, "Expected object, received string");
        assert_eq!(issue.expected, Some("object"));
        assert_eq!(issue.received, Some("string"));
    }

    #[test]
    fn serialize_issue() {
        let issue = ApiValidationIssue::from(&ValidationIssue {
            field: ContactField::Name,
            kind: ValidationIssueKind::TooLong { maximum: 120 },
        });

        assert_eq!(
            serde_json::to_value(issue).unwrap(),
            json!({
                "code": "too_big",
                "path": ["name"],
                "message": "String must contain at most 120 character(s)",
                "maximum": 120,
                "type": "string",
                "inclusive": true,
                "exact": false,
            })
        );
    }

    #[test]
    fn serialize_too_short_issue() {
        let issue = ApiValidationIssue::from(&ValidationIssue {
            field: ContactField::Message,
            kind: ValidationIssueKind::TooShort { minimum: 1 },
        });

        assert_eq!(
            serde_json::to_value(issue).unwrap(),
            json!({
                "code": "too_small",
                "path": ["message"],
                "message": "String must contain at least 1 character(s)",
                "minimum": 1,
                "type": "string",
                "inclusive": true,
                "exact": false,
            })
        );
    }

    #[test]
    fn serialize_invalid_email_issue() {
        let issue = ApiValidationIssue::from(&ValidationIssue {
            field: ContactField::Email,
            kind: ValidationIssueKind::InvalidEmail,
        });

        assert_eq!(
            serde_json::to_value(issue).unwrap(),
            json!({
                "code": "invalid_string",
                "path": ["email"],
                "message": "Invalid email",
                "validation": "email",
            })
        );
    }

    #[test]
    fn serialize_required_issue() {
        let issue = ApiValidationIssue::from(&ValidationIssue {
            field: ContactField::Message,
            kind: ValidationIssueKind::Required,
        });

        assert_eq!(
            serde_json::to_value(issue).unwrap(),
            json!({
                "code": "invalid_type",
                "path": ["message"],
                "message": "Required",
                "expected": "string",
                "received": "undefined",
            })
        );
    }
}
