use std::future::Future;

use folio_models::{
    contact::{ContactSubmissionInput, ValidationIssues},
    message_id::MessageId,
};
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactService: Send + Sync + 'static {
    /// Validate a contact form submission and relay it to the site owner by
    /// email.
    fn send_message(
        &self,
        input: ContactSubmissionInput,
    ) -> impl Future<Output = Result<MessageId, ContactSendMessageError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactSendMessageError {
    #[error("Validation failed.")]
    Validation(#[from] ValidationIssues),
    #[error("Email failed to send: {0}")]
    Delivery(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactService {
    pub fn with_send_message(
        mut self,
        input: ContactSubmissionInput,
        result: Result<MessageId, ContactSendMessageError>,
    ) -> Self {
        self.expect_send_message()
            .once()
            .with(mockall::predicate::eq(input))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
