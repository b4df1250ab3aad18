use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use tracing::{debug, warn};

use crate::api::{ContactApi, ContactApiError, ContactPayload, ContactReply};

pub const SUCCESS_MESSAGE: &str = "Message sent successfully!";
pub const NETWORK_FAILURE_MESSAGE: &str = "Failed to send message. Please try again later.";

/// What the visitor has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub user_name: String,
    pub user_email: String,
    pub subject: String,
    pub message: String,
}

impl ContactDraft {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_empty()
            && self.user_email.is_empty()
            && self.subject.is_empty()
            && self.message.is_empty()
    }

    fn into_payload(self) -> ContactPayload {
        ContactPayload {
            name: self.user_name,
            email: self.user_email,
            subject: self.subject,
            message: self.message,
            phone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    UserName,
    UserEmail,
    Subject,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Receives the outcome of every submission.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

impl<T: Notifier> Notifier for Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was still in flight, nothing was sent.
    Busy,
    Sent { message_id: Option<String> },
    Failed,
}

#[derive(Debug)]
pub struct ContactForm<Api, Notify> {
    api: Api,
    notifier: Notify,
    draft: Mutex<ContactDraft>,
    sending: AtomicBool,
}

impl<Api, Notify> ContactForm<Api, Notify>
where
    Api: ContactApi,
    Notify: Notifier,
{
    pub fn new(api: Api, notifier: Notify) -> Self {
        Self {
            api,
            notifier,
            draft: Default::default(),
            sending: AtomicBool::new(false),
        }
    }

    pub fn update(&self, field: DraftField, value: impl Into<String>) {
        let mut draft = self.lock_draft();
        let slot = match field {
            DraftField::UserName => &mut draft.user_name,
            DraftField::UserEmail => &mut draft.user_email,
            DraftField::Subject => &mut draft.subject,
            DraftField::Message => &mut draft.message,
        };
        *slot = value.into();
    }

    pub fn draft(&self) -> ContactDraft {
        self.lock_draft().clone()
    }

    pub fn state(&self) -> FormState {
        if self.sending.load(Ordering::Acquire) {
            FormState::Submitting
        } else {
            FormState::Idle
        }
    }

    /// Send the current draft to the relay and notify about the outcome.
    ///
    /// Returns [`SubmitOutcome::Busy`] without sending anything while another
    /// submission is in flight. The draft is only cleared after the relay
    /// confirmed the delivery.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(_guard) = SendingGuard::acquire(&self.sending) else {
            debug!("submission already in flight");
            return SubmitOutcome::Busy;
        };

        let payload = self.draft().into_payload();

        let (notification, outcome) = match self.api.send(payload).await {
            Ok(ContactReply {
                ok: true,
                message_id,
                ..
            }) => {
                *self.lock_draft() = ContactDraft::default();
                (
                    Notification::success(SUCCESS_MESSAGE),
                    SubmitOutcome::Sent { message_id },
                )
            }
            Ok(ContactReply { error, .. }) => {
                let error = error.as_deref().unwrap_or("Unknown error");
                warn!("relay refused contact message: {error}");
                (
                    Notification::error(format!("Failed to send: {error}")),
                    SubmitOutcome::Failed,
                )
            }
            Err(err @ ContactApiError::Status { .. }) => {
                warn!("{err}");
                (Notification::error(err.to_string()), SubmitOutcome::Failed)
            }
            Err(ContactApiError::Transport(err)) => {
                warn!("Failed to reach the relay: {err:#}");
                (
                    Notification::error(NETWORK_FAILURE_MESSAGE),
                    SubmitOutcome::Failed,
                )
            }
        };

        self.notifier.notify(notification);
        outcome
    }

    fn lock_draft(&self) -> MutexGuard<'_, ContactDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the in-flight flag and releases it on every exit path.
struct SendingGuard<'a>(&'a AtomicBool);

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::MockContactApi;

    #[derive(Debug, Default)]
    struct RecordingNotifier(Mutex<Vec<Notification>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    impl RecordingNotifier {
        fn take(&self) -> Vec<Notification> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn fill(form: &ContactForm<impl ContactApi, impl Notifier>) {
        form.update(DraftField::UserName, "Jane");
        form.update(DraftField::UserEmail, "jane@x.com");
        form.update(DraftField::Subject, "Hi");
        form.update(DraftField::Message, "Hello there");
    }

    fn payload() -> ContactPayload {
        ContactPayload {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            subject: "Hi".into(),
            message: "Hello there".into(),
            phone: None,
        }
    }

    fn reply(ok: bool, message_id: Option<&str>, error: Option<&str>) -> ContactReply {
        ContactReply {
            ok,
            message_id: message_id.map(Into::into),
            error: error.map(Into::into),
        }
    }

    #[test]
    fn update_overwrites_field() {
        let form = ContactForm::new(MockContactApi::new(), RecordingNotifier::default());

        form.update(DraftField::Message, "Hel");
        form.update(DraftField::Message, "Hello");

        assert_eq!(
            form.draft(),
            ContactDraft {
                message: "Hello".into(),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn ok() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::default());
        let api = MockContactApi::new().with_send(
            payload(),
            Ok(reply(true, Some("<abc@example.com>"), None)),
        );
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        let result = sut.submit().await;

        // Assert
        assert_eq!(
            result,
            SubmitOutcome::Sent {
                message_id: Some("<abc@example.com>".into())
            }
        );
        assert!(sut.draft().is_empty());
        assert_eq!(sut.state(), FormState::Idle);
        assert_eq!(notifier.take(), [Notification::success(SUCCESS_MESSAGE)]);
    }

    #[tokio::test]
    async fn relay_refused() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::default());
        let api = MockContactApi::new().with_send(
            payload(),
            Ok(reply(false, None, Some("Mailbox full"))),
        );
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        let result = sut.submit().await;

        // Assert
        assert_eq!(result, SubmitOutcome::Failed);
        assert_eq!(sut.draft().user_name, "Jane");
        assert_eq!(
            notifier.take(),
            [Notification::error("Failed to send: Mailbox full")]
        );
    }

    #[tokio::test]
    async fn relay_refused_without_reason() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::default());
        let api = MockContactApi::new().with_send(payload(), Ok(reply(false, None, None)));
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        sut.submit().await;

        // Assert
        assert_eq!(
            notifier.take(),
            [Notification::error("Failed to send: Unknown error")]
        );
    }

    #[tokio::test]
    async fn server_error() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::default());
        let api = MockContactApi::new().with_send(
            payload(),
            Err(ContactApiError::Status {
                status: 500,
                body: r#"{"ok":false,"error":"Email failed to send"}"#.into(),
            }),
        );
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        let result = sut.submit().await;

        // Assert
        assert_eq!(result, SubmitOutcome::Failed);
        assert_eq!(
            notifier.take(),
            [Notification::error(
                r#"Server error 500: {"ok":false,"error":"Email failed to send"}"#
            )]
        );
        assert!(!sut.draft().is_empty());
    }

    #[tokio::test]
    async fn network_failure() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::default());
        let api = MockContactApi::new()
            .with_send(payload(), Err(anyhow!("connection refused").into()));
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        let result = sut.submit().await;

        // Assert
        assert_eq!(result, SubmitOutcome::Failed);
        assert_eq!(sut.state(), FormState::Idle);
        assert_eq!(notifier.take(), [Notification::error(NETWORK_FAILURE_MESSAGE)]);
    }

    #[tokio::test]
    async fn submit_while_sending_is_ignored() {
        // Arrange
        let release = Arc::new(Notify::new());
        let mut api = MockContactApi::new();
        {
            let release = Arc::clone(&release);
            api.expect_send().once().return_once(move |_| {
                Box::pin(async move {
                    release.notified().await;
                    Ok(reply(true, Some("<abc@example.com>"), None))
                })
            });
        }
        let notifier = Arc::new(RecordingNotifier::default());
        let sut = ContactForm::new(api, Arc::clone(&notifier));
        fill(&sut);

        // Act
        let first = sut.submit();
        let second = async {
            tokio::task::yield_now().await;
            assert_eq!(sut.state(), FormState::Submitting);
            let outcome = sut.submit().await;
            release.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        // Assert
        assert_eq!(second, SubmitOutcome::Busy);
        assert!(matches!(first, SubmitOutcome::Sent { .. }));
        assert_eq!(sut.state(), FormState::Idle);
        assert_eq!(notifier.take().len(), 1);
    }
}
