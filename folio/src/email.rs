use anyhow::Context;
use folio_config::Config;
use folio_email_impl::EmailServiceImpl;

use crate::environment;

/// Set up the smtp transport described by the config. No connection is
/// opened until the first email is sent or the server is pinged.
pub fn connect(config: &Config) -> anyhow::Result<EmailServiceImpl> {
    let sender = config.sender()?;
    EmailServiceImpl::new(&environment::smtp_settings(&config.smtp), sender)
        .context("Failed to configure SMTP transport")
}
