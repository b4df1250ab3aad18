use std::future::Future;

use folio_models::{email_address::EmailAddressWithName, message_id::MessageId};
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Hand the email over to the smtp server and return the id it was sent
    /// with.
    fn send(&self, email: Email) -> impl Future<Output = Result<MessageId, EmailSendError>> + Send;

    /// Check that the smtp server is reachable and accepts our credentials,
    /// without sending anything.
    fn ping(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddressWithName,
    pub subject: String,
    pub body: String,
    pub content_type: ContentType,
    pub reply_to: Option<EmailAddressWithName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Html,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    /// The smtp server answered with a negative reply.
    #[error("smtp server rejected the message: {0}")]
    Rejected(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_send(mut self, email: Email, result: Result<MessageId, String>) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(move |_| {
                Box::pin(std::future::ready(result.map_err(EmailSendError::Rejected)))
            });
        self
    }

    pub fn with_ping(mut self, result: Result<(), String>) -> Self {
        self.expect_ping().once().return_once(move || {
            Box::pin(std::future::ready(
                result.map_err(|err| anyhow::anyhow!(err)),
            ))
        });
        self
    }
}
