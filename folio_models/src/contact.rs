use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;
use thiserror::Error;

use crate::email_address::EmailAddress;

pub const NAME_MIN_LEN: usize = 1;
pub const NAME_MAX_LEN: usize = 120;
pub const MESSAGE_MIN_LEN: usize = 1;
pub const MESSAGE_MAX_LEN: usize = 5000;

/// Syntax accepted for the sender's address: a dotted local part and a
/// hostname with an alphabetic top-level domain. Quoted local parts, ip
/// literals and dotless domains are rejected.
pub static EMAIL_ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .unwrap()
});

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub author: ContactAuthor,
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub message: ContactMessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactAuthor {
    pub name: ContactAuthorName,
    pub email: EmailAddress,
}

#[nutype(
    validate(len_char_min = 1, len_char_max = 120),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactAuthorName(String);

#[nutype(
    validate(len_char_min = 1, len_char_max = 5000),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);

/// A submission as received from the caller, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmissionInput {
    pub name: FieldInput,
    pub email: FieldInput,
    pub subject: FieldInput,
    pub phone: FieldInput,
    pub message: FieldInput,
}

/// The raw shape of a single field of a [`ContactSubmissionInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldInput {
    #[default]
    Missing,
    Text(String),
    Other(ValueKind),
}

/// Kind of a value that is not a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Number,
    Boolean,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Phone,
    Message,
}

impl ContactField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Phone => "phone",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: ContactField,
    pub kind: ValidationIssueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssueKind {
    /// A required field is missing entirely.
    Required,
    /// The field is present but is not a string.
    InvalidType { received: ValueKind },
    TooShort { minimum: usize },
    TooLong { maximum: usize },
    InvalidEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contact submission is invalid ({} issue(s))", .0.len())]
pub struct ValidationIssues(pub Vec<ValidationIssue>);

impl ValidationIssues {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = ContactField> + '_ {
        self.0.iter().map(|issue| issue.field)
    }
}

impl ContactSubmission {
    /// Validate every field of `input`, collecting all violations instead of
    /// stopping at the first one.
    pub fn validate(input: ContactSubmissionInput) -> Result<Self, ValidationIssues> {
        let mut validator = Validator::default();

        let name = validator
            .required(ContactField::Name, input.name)
            .and_then(|name| {
                validator.check(
                    ContactField::Name,
                    ContactAuthorName::try_new(name),
                    |err| match err {
                        ContactAuthorNameError::LenCharMinViolated => {
                            ValidationIssueKind::TooShort {
                                minimum: NAME_MIN_LEN,
                            }
                        }
                        ContactAuthorNameError::LenCharMaxViolated => {
                            ValidationIssueKind::TooLong {
                                maximum: NAME_MAX_LEN,
                            }
                        }
                    },
                )
            });

        let email = validator
            .required(ContactField::Email, input.email)
            .and_then(|email| {
                validator.check(ContactField::Email, parse_sender_address(&email), |()| {
                    ValidationIssueKind::InvalidEmail
                })
            });

        let message = validator
            .required(ContactField::Message, input.message)
            .and_then(|message| {
                validator.check(
                    ContactField::Message,
                    ContactMessageContent::try_new(message),
                    |err| match err {
                        ContactMessageContentError::LenCharMinViolated => {
                            ValidationIssueKind::TooShort {
                                minimum: MESSAGE_MIN_LEN,
                            }
                        }
                        ContactMessageContentError::LenCharMaxViolated => {
                            ValidationIssueKind::TooLong {
                                maximum: MESSAGE_MAX_LEN,
                            }
                        }
                    },
                )
            });

        let phone = validator.optional(ContactField::Phone, input.phone);
        let subject = validator.optional(ContactField::Subject, input.subject);

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) if validator.issues.is_empty() => Ok(Self {
                author: ContactAuthor { name, email },
                subject,
                phone,
                message,
            }),
            _ => Err(ValidationIssues(validator.issues)),
        }
    }
}

fn parse_sender_address(email: &str) -> Result<EmailAddress, ()> {
    let well_formed = EMAIL_ADDRESS_REGEX.is_match(email)
        && !email.starts_with('.')
        && !email.contains("..");
    if !well_formed {
        return Err(());
    }
    email.parse().map_err(|_| ())
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn push(&mut self, field: ContactField, kind: ValidationIssueKind) {
        self.issues.push(ValidationIssue { field, kind });
    }

    fn required(&mut self, field: ContactField, input: FieldInput) -> Option<String> {
        match input {
            FieldInput::Text(text) => Some(text),
            FieldInput::Missing => {
                self.push(field, ValidationIssueKind::Required);
                None
            }
            FieldInput::Other(received) => {
                self.push(field, ValidationIssueKind::InvalidType { received });
                None
            }
        }
    }

    /// Absent, `null` and empty values all count as "not provided".
    fn optional(&mut self, field: ContactField, input: FieldInput) -> Option<String> {
        match input {
            FieldInput::Text(text) if text.is_empty() => None,
            FieldInput::Text(text) => Some(text),
            FieldInput::Missing | FieldInput::Other(ValueKind::Null) => None,
            FieldInput::Other(received) => {
                self.push(field, ValidationIssueKind::InvalidType { received });
                None
            }
        }
    }

    fn check<T, E>(
        &mut self,
        field: ContactField,
        result: Result<T, E>,
        kind: impl FnOnce(E) -> ValidationIssueKind,
    ) -> Option<T> {
        result.map_err(|err| self.push(field, kind(err))).ok()
    }
}
