//! Wiring of the services from the loaded config

use std::sync::Arc;

use folio_api_rest::{
    RestServer, RestServerConfig, RestServerRateLimitConfig, RestServerRealIpConfig,
};
use folio_config::{Config, HttpConfig, SmtpConfig, SmtpTlsConfig};
use folio_core_contact_impl::{ContactServiceConfig, ContactServiceImpl};
use folio_core_health_impl::{HealthServiceConfig, HealthServiceImpl};
use folio_email_contracts::EmailService;
use folio_email_impl::{SmtpCredentials, SmtpSettings, SmtpTls};
use folio_templates_impl::{TemplateServiceConfig, TemplateServiceImpl};

pub type ContactService<Email> = ContactServiceImpl<Email, TemplateServiceImpl>;
pub type HealthService<Email> = HealthServiceImpl<Email>;
pub type Server<Email> = RestServer<HealthService<Email>, ContactService<Email>>;

/// Build the rest server on top of the given email service.
pub fn rest_server<Email>(config: &Config, email: Email) -> anyhow::Result<Server<Email>>
where
    Email: EmailService + Clone,
{
    let template = TemplateServiceImpl::new(TemplateServiceConfig {
        escape_html: config.templates.escape_html,
    })?;

    let contact = ContactServiceImpl::new(email.clone(), template, contact_service_config(config)?);
    let health = HealthServiceImpl::new(
        email,
        HealthServiceConfig {
            cache_ttl: config.health.cache_ttl.into(),
        },
    );

    Ok(RestServer::new(health, contact, rest_server_config(&config.http)))
}

pub fn contact_service_config(config: &Config) -> anyhow::Result<ContactServiceConfig> {
    Ok(ContactServiceConfig {
        recipient: Arc::new(config.recipient()?.into()),
        default_subject: config.contact.default_subject.as_str().into(),
    })
}

pub fn rest_server_config(config: &HttpConfig) -> RestServerConfig {
    RestServerConfig {
        cors_origin: config.cors_origin.clone(),
        body_limit: config.body_limit,
        rate_limit: config
            .rate_limit
            .enable
            .then_some(RestServerRateLimitConfig {
                requests: config.rate_limit.requests,
                window: config.rate_limit.window.into(),
            }),
        real_ip: config.real_ip.as_ref().map(|real_ip| {
            RestServerRealIpConfig {
                header: real_ip.header.clone(),
                set_from: real_ip.set_from,
            }
            .into()
        }),
    }
}

pub fn smtp_settings(config: &SmtpConfig) -> SmtpSettings {
    SmtpSettings {
        host: config.host.clone(),
        port: config.port,
        tls: match config.tls {
            SmtpTlsConfig::None => SmtpTls::None,
            SmtpTlsConfig::Opportunistic => SmtpTls::Opportunistic,
            SmtpTlsConfig::Starttls => SmtpTls::Starttls,
            SmtpTlsConfig::Tls => SmtpTls::Tls,
        },
        credentials: config
            .username
            .clone()
            .zip(config.password.clone())
            .map(|(username, password)| SmtpCredentials { username, password }),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path, time::Duration};

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect::<HashMap<_, _>>();
        folio_config::load_with(&[] as &[&Path], |key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn smtp_settings_from_env() {
        let config = load(&[
            ("SMTP_HOST", "mail.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_TLS", "tls"),
            ("SMTP_USER", "me@example.com"),
            ("SMTP_PASS", "hunter2"),
        ]);

        let settings = smtp_settings(&config.smtp);

        assert_eq!(
            settings,
            SmtpSettings {
                host: "mail.example.com".into(),
                port: 465,
                tls: SmtpTls::Tls,
                credentials: Some(SmtpCredentials {
                    username: "me@example.com".into(),
                    password: "hunter2".into(),
                }),
            }
        );
    }

    #[test]
    fn smtp_settings_without_password() {
        let config = load(&[("SMTP_USER", "me@example.com")]);

        assert_eq!(smtp_settings(&config.smtp).credentials, None);
    }

    #[test]
    fn default_rest_server_config() {
        let config = load(&[]);

        let result = rest_server_config(&config.http);

        assert_eq!(result.cors_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(result.body_limit, 1024 * 1024);
        let rate_limit = result.rate_limit.unwrap();
        assert_eq!(rate_limit.requests, 10);
        assert_eq!(rate_limit.window, Duration::from_secs(60));
        assert!(result.real_ip.is_none());
    }

    #[test]
    fn contact_config_falls_back_to_smtp_user() {
        let config = load(&[("SMTP_USER", "me@example.com")]);

        let result = contact_service_config(&config).unwrap();

        assert_eq!(result.recipient.email(), "me@example.com");
        assert_eq!(
            &*result.default_subject,
            "New message from portfolio contact form"
        );
    }
}
