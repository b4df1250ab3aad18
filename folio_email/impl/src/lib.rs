use anyhow::anyhow;
use folio_email_contracts::{ContentType, Email, EmailSendError, EmailService};
use folio_models::{email_address::EmailAddressWithName, message_id::MessageId};
use folio_utils::Apply;
use lettre::{
    message::{header, MessageBuilder},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    from: EmailAddressWithName,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub tls: SmtpTls,
    pub credentials: Option<SmtpCredentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain text connection.
    None,
    /// Upgrade via `STARTTLS` if the server offers it.
    Opportunistic,
    /// Require `STARTTLS`.
    Starttls,
    /// Implicit TLS from the first byte (usually port 465).
    Tls,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl EmailServiceImpl {
    pub fn new(settings: &SmtpSettings, from: EmailAddressWithName) -> anyhow::Result<Self> {
        let tls = match settings.tls {
            SmtpTls::None => Tls::None,
            SmtpTls::Opportunistic => {
                Tls::Opportunistic(TlsParameters::new(settings.host.clone())?)
            }
            SmtpTls::Starttls => Tls::Required(TlsParameters::new(settings.host.clone())?),
            SmtpTls::Tls => Tls::Wrapper(TlsParameters::new(settings.host.clone())?),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .apply_map(settings.credentials.clone(), |builder, credentials| {
                builder.credentials(Credentials::new(credentials.username, credentials.password))
            })
            .build();

        Ok(Self { from, transport })
    }

    fn build_message(&self, email: Email, message_id: &MessageId) -> anyhow::Result<Message> {
        Message::builder()
            .message_id(Some(message_id.as_str().into()))
            .from(self.from.0.clone())
            .to(email.recipient.0)
            .apply_map(email.reply_to.map(|x| x.0), MessageBuilder::reply_to)
            .subject(email.subject)
            .header(match email.content_type {
                ContentType::Text => header::ContentType::TEXT_PLAIN,
                ContentType::Html => header::ContentType::TEXT_HTML,
            })
            .body(email.body)
            .map_err(Into::into)
    }
}

impl EmailService for EmailServiceImpl {
    async fn send(&self, email: Email) -> Result<MessageId, EmailSendError> {
        let message_id = MessageId::generate(&self.from.clone().into_email_address());
        let message = self.build_message(email, &message_id)?;

        match self.transport.send(message).await {
            Ok(response) if response.is_positive() => {
                debug!(%message_id, code = %response.code(), "email accepted by smtp server");
                Ok(message_id)
            }
            Ok(response) => Err(EmailSendError::Rejected(format!(
                "{} {}",
                response.code(),
                response
                    .message()
                    .map(|line| line.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            ))),
            Err(err) if err.is_permanent() || err.is_transient() => {
                Err(EmailSendError::Rejected(err.to_string()))
            }
            Err(err) => Err(EmailSendError::Other(err.into())),
        }
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.transport
            .test_connection()
            .await?
            .then_some(())
            .ok_or_else(|| anyhow!("Failed to ping smtp server"))
    }
}
