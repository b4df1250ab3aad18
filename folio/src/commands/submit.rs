use anyhow::ensure;
use clap::Args;
use folio_client::{
    ContactForm, DraftField, HttpContactApi, Notification, NotificationKind, Notifier,
    SubmitOutcome,
};
use url::Url;

/// Fill in the contact form and send it to a running relay
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Base url of the relay
    #[arg(long, default_value = "http://localhost:8080/")]
    url: Url,
    /// Your name
    #[arg(long)]
    name: String,
    /// Your email address
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    subject: String,
    /// The message to send
    message: String,
}

impl SubmitCommand {
    pub async fn invoke(self) -> anyhow::Result<()> {
        let form = ContactForm::new(HttpContactApi::new(&self.url)?, Terminal);
        form.update(DraftField::UserName, self.name);
        form.update(DraftField::UserEmail, self.email);
        form.update(DraftField::Subject, self.subject);
        form.update(DraftField::Message, self.message);

        let outcome = form.submit().await;
        if let SubmitOutcome::Sent {
            message_id: Some(message_id),
        } = &outcome
        {
            println!("Message-ID: {message_id}");
        }
        ensure!(
            matches!(outcome, SubmitOutcome::Sent { .. }),
            "Failed to submit contact message"
        );

        Ok(())
    }
}

struct Terminal;

impl Notifier for Terminal {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.message),
            NotificationKind::Error => eprintln!("{}", notification.message),
        }
    }
}
