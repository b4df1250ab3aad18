use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{File, FileFormat};
use folio_models::email_address::{EmailAddress, EmailAddressWithName};
use serde::Deserialize;

pub use duration::Duration;

mod duration;

/// The built-in defaults, merged before any other source.
pub const DEFAULT_CONFIG: &str = include_str!("../../config.toml");

/// Environment variable listing additional config files.
pub const CONFIG_PATHS_ENV: &str = "FOLIO_CONFIG";

/// Plain environment variables overriding single config keys.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "http.host"),
    ("PORT", "http.port"),
    ("CORS_ORIGIN", "http.cors_origin"),
    ("SMTP_HOST", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("SMTP_TLS", "smtp.tls"),
    ("SMTP_USER", "smtp.username"),
    ("SMTP_PASS", "smtp.password"),
    ("FROM_NAME", "email.from_name"),
    ("FROM_EMAIL", "email.from_address"),
    ("TO_EMAIL", "contact.recipient"),
];

/// Load the config from the defaults, the files in `FOLIO_CONFIG` and the
/// process environment.
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var_os(CONFIG_PATHS_ENV)
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<PathBuf>>())
        .unwrap_or_default();

    load_with(&paths, |key| std::env::var(key).ok())
}

/// Load the config from the defaults, the given files and the variables
/// provided by `env`. Empty variables are treated as unset.
pub fn load_with(
    paths: &[impl AsRef<Path>],
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let builder = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    let builder = paths.iter().try_fold(builder, |builder, path| {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let source = File::from_str(&content, FileFormat::Toml);
        anyhow::Ok(builder.add_source(source))
    })?;

    let builder = ENV_OVERRIDES
        .iter()
        .try_fold(builder, |builder, &(var, key)| {
            builder.set_override_option(key, env(var).filter(|value| !value.is_empty()))
        })?;

    builder
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub smtp: SmtpConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
    pub health: HealthConfig,
    pub templates: TemplatesConfig,
}

impl Config {
    /// The mailbox contact emails are sent from. Falls back to the smtp
    /// username when no explicit address is configured.
    pub fn sender(&self) -> anyhow::Result<EmailAddressWithName> {
        let address = match &self.email.from_address {
            Some(address) => address.clone(),
            None => self.smtp_user_address("email.from_address")?,
        };
        Ok(address.with_name(self.email.from_name.clone()))
    }

    /// The address contact emails are delivered to. Falls back to the smtp
    /// username when no explicit recipient is configured.
    pub fn recipient(&self) -> anyhow::Result<EmailAddress> {
        match &self.contact.recipient {
            Some(recipient) => Ok(recipient.clone()),
            None => self.smtp_user_address("contact.recipient"),
        }
    }

    fn smtp_user_address(&self, key: &str) -> anyhow::Result<EmailAddress> {
        self.smtp
            .username
            .as_deref()
            .with_context(|| format!("Neither {key} nor smtp.username is configured"))?
            .parse()
            .with_context(|| format!("{key} is not set and smtp.username is not an email address"))
    }
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// The single origin allowed to call the api from a browser.
    pub cors_origin: Option<String>,
    /// Maximum size of a request body in bytes.
    pub body_limit: usize,
    pub rate_limit: RateLimitConfig,
    pub real_ip: Option<RealIpConfig>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitConfig {
    pub enable: bool,
    pub requests: u32,
    pub window: Duration,
}

#[derive(Debug, Deserialize)]
pub struct RealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

#[derive(Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: SmtpTlsConfig,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTlsConfig {
    None,
    Opportunistic,
    Starttls,
    Tls,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub from_name: String,
    pub from_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub recipient: Option<EmailAddress>,
    pub default_subject: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
pub struct TemplatesConfig {
    pub escape_html: bool,
}
