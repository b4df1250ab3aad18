use anyhow::Context;
use folio_config::Config;
use folio_email_contracts::EmailService;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{email, environment};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Connecting to smtp server");
    let email = email::connect(&config)?;
    if let Err(err) = email.ping().await {
        // the health endpoint keeps reporting this until the server is reachable
        warn!("SMTP server not verified: {err:#}");
    }

    let server = environment::rest_server(&config, email)?;

    let listener = TcpListener::bind((config.http.host, config.http.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind to {}:{}",
                config.http.host, config.http.port
            )
        })?;
    info!("Starting http server on {}", listener.local_addr()?);
    server.serve(listener).await
}
