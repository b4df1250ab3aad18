use std::sync::Arc;

use folio_core_contact_contracts::{ContactSendMessageError, ContactService};
use folio_email_contracts::{ContentType, Email, EmailService};
use folio_models::{
    contact::{ContactSubmission, ContactSubmissionInput},
    email_address::EmailAddressWithName,
    message_id::MessageId,
};
use folio_templates_contracts::{ContactMessageTemplate, TemplateService};
use tracing::{error, info};

pub const DEFAULT_SUBJECT: &str = "New message from portfolio contact form";

#[derive(Debug, Clone)]
pub struct ContactServiceImpl<Email, Template> {
    email: Email,
    template: Template,
    config: ContactServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ContactServiceConfig {
    /// Where contact messages are delivered to.
    pub recipient: Arc<EmailAddressWithName>,
    /// Subject used when the submission does not provide one.
    pub default_subject: Arc<str>,
}

impl<Email, Template> ContactServiceImpl<Email, Template> {
    pub fn new(email: Email, template: Template, config: ContactServiceConfig) -> Self {
        Self {
            email,
            template,
            config,
        }
    }
}

impl<EmailS, TemplateS> ContactService for ContactServiceImpl<EmailS, TemplateS>
where
    EmailS: EmailService,
    TemplateS: TemplateService,
{
    async fn send_message(
        &self,
        input: ContactSubmissionInput,
    ) -> Result<MessageId, ContactSendMessageError> {
        let ContactSubmission {
            author,
            subject,
            phone,
            message,
        } = ContactSubmission::validate(input)?;

        let body = self.template.render(&ContactMessageTemplate {
            name: (*author.name).clone(),
            email: author.email.to_string(),
            phone,
            subject: subject.clone(),
            message: message.into_inner(),
        })?;

        let email = Email {
            recipient: (*self.config.recipient).clone(),
            subject: subject.unwrap_or_else(|| self.config.default_subject.to_string()),
            body,
            content_type: ContentType::Html,
            reply_to: Some(author.email.with_name(author.name.into_inner())),
        };

        match self.email.send(email).await {
            Ok(message_id) => {
                info!(%message_id, "relayed contact message");
                Ok(message_id)
            }
            Err(err) => {
                error!("Failed to relay contact message: {err}");
                Err(ContactSendMessageError::Delivery(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use folio_email_contracts::MockEmailService;
    use folio_models::contact::{ContactField, FieldInput, ValueKind};
    use folio_templates_contracts::MockTemplateService;
    use folio_utils::assert_matches;

    use super::*;

    fn config() -> ContactServiceConfig {
        ContactServiceConfig {
            recipient: Arc::new("owner@example.com".parse().unwrap()),
            default_subject: DEFAULT_SUBJECT.into(),
        }
    }

    fn input() -> ContactSubmissionInput {
        ContactSubmissionInput {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            subject: "Hi".into(),
            phone: FieldInput::Other(ValueKind::Null),
            message: "Hello there".into(),
        }
    }

    fn template() -> ContactMessageTemplate {
        ContactMessageTemplate {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            phone: None,
            subject: Some("Hi".into()),
            message: "Hello there".into(),
        }
    }

    fn email(config: &ContactServiceConfig, subject: &str) -> Email {
        Email {
            recipient: (*config.recipient).clone(),
            subject: subject.into(),
            body: "<p>rendered</p>".into(),
            content_type: ContentType::Html,
            reply_to: Some("Jane <jane@x.com>".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn ok() {
        // Arrange
        let config = config();
        let message_id = MessageId::from("<id@example.com>".to_owned());

        let template = MockTemplateService::new().with_render(template(), "<p>rendered</p>".into());
        let email =
            MockEmailService::new().with_send(email(&config, "Hi"), Ok(message_id.clone()));

        let sut = ContactServiceImpl::new(email, template, config);

        // Act
        let result = sut.send_message(input()).await;

        // Assert
        assert_eq!(result.unwrap(), message_id);
    }

    #[tokio::test]
    async fn ok_default_subject() {
        // Arrange
        let config = config();
        let message_id = MessageId::from("<id@example.com>".to_owned());

        let template = MockTemplateService::new().with_render(
            ContactMessageTemplate {
                subject: None,
                ..template()
            },
            "<p>rendered</p>".into(),
        );
        let email = MockEmailService::new()
            .with_send(email(&config, DEFAULT_SUBJECT), Ok(message_id.clone()));

        let sut = ContactServiceImpl::new(email, template, config);

        // Act
        let result = sut
            .send_message(ContactSubmissionInput {
                subject: FieldInput::Missing,
                ..input()
            })
            .await;

        // Assert
        assert_eq!(result.unwrap(), message_id);
    }

    #[tokio::test]
    async fn invalid_submission_is_not_sent() {
        // Arrange
        let sut = ContactServiceImpl::new(
            MockEmailService::new(),
            MockTemplateService::new(),
            config(),
        );

        // Act
        let result = sut
            .send_message(ContactSubmissionInput {
                email: "not-an-email".into(),
                message: FieldInput::Missing,
                ..input()
            })
            .await;

        // Assert
        assert_matches!(
            result,
            Err(ContactSendMessageError::Validation(issues))
                if issues.fields().collect::<Vec<_>>() == [ContactField::Email, ContactField::Message]
        );
    }

    #[tokio::test]
    async fn delivery_error() {
        // Arrange
        let config = config();

        let template = MockTemplateService::new().with_render(template(), "<p>rendered</p>".into());
        let email = MockEmailService::new().with_send(
            email(&config, "Hi"),
            Err("535 authentication failed".into()),
        );

        let sut = ContactServiceImpl::new(email, template, config);

        // Act
        let result = sut.send_message(input()).await;

        // Assert
        assert_matches!(
            result,
            Err(ContactSendMessageError::Delivery(details)) if details.contains("535 authentication failed")
        );
    }
}
