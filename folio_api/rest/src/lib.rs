use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use folio_core_contact_contracts::ContactService;
use folio_core_health_contracts::HealthService;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    /// Origin allowed to call the api from a browser. Cross origin requests
    /// are not answered with cors headers if unset.
    pub cors_origin: Option<String>,
    pub body_limit: usize,
    pub rate_limit: Option<RestServerRateLimitConfig>,
    pub real_ip: Option<Arc<RestServerRealIpConfig>>,
}

#[derive(Debug, Clone, Copy)]
pub struct RestServerRateLimitConfig {
    /// Number of requests a single client may send per window.
    pub requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct RestServerRealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthService,
    Contact: ContactService,
{
    pub fn new(health: Health, contact: Contact, config: RestServerConfig) -> Self {
        Self {
            health,
            contact,
            config,
        }
    }

    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let router = self.router()?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(Into::into)
    }

    fn router(self) -> anyhow::Result<Router<()>> {
        let cors = self
            .config
            .cors_origin
            .as_deref()
            .map(cors_layer)
            .transpose()?;

        let api = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(self.contact.into()));
        let api = match self.config.rate_limit {
            Some(config) => middlewares::rate_limit::add(config)?(api),
            None => api,
        };

        let router = Router::new()
            .merge(routes::index::router())
            .merge(api)
            .layer(DefaultBodyLimit::max(self.config.body_limit))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ));
        let router = match cors {
            Some(cors) => router.layer(cors),
            None => router,
        };
        let router = middlewares::panic_handler::add(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::client_ip::add(self.config.real_ip)(router);
        let router = middlewares::request_id::add(router);

        Ok(router)
    }
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid cors origin {origin:?}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false))
}
