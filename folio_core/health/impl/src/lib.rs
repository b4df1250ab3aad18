use std::{sync::Arc, time::Duration};

use folio_core_health_contracts::{HealthService, HealthStatus, TransportUnavailable};
use folio_email_contracts::EmailService;
use tokio::{sync::RwLock, time::Instant};
use tracing::error;

#[derive(Debug, Clone)]
pub struct HealthServiceImpl<Email> {
    email: Email,
    config: HealthServiceConfig,
    state: Arc<State>,
}

#[derive(Debug, Clone)]
pub struct HealthServiceConfig {
    /// How long a health check result is reused. Zero checks on every call.
    pub cache_ttl: Duration,
}

#[derive(Debug, Default)]
struct State {
    cache: RwLock<Option<CachedStatus>>,
}

#[derive(Debug)]
struct CachedStatus {
    status: HealthStatus,
    timestamp: Instant,
}

impl CachedStatus {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now < self.timestamp + ttl
    }
}

impl<Email> HealthServiceImpl<Email> {
    pub fn new(email: Email, config: HealthServiceConfig) -> Self {
        Self {
            email,
            config,
            state: Default::default(),
        }
    }
}

impl<Email> HealthService for HealthServiceImpl<Email>
where
    Email: EmailService,
{
    async fn get_status(&self) -> HealthStatus {
        let now = Instant::now();
        let cache_guard = self.state.cache.read().await;
        if let Some(cached) = cache_guard
            .as_ref()
            .filter(|c| c.is_fresh(now, self.config.cache_ttl))
        {
            return cached.status.clone();
        }
        drop(cache_guard);

        let mut cache_guard = self.state.cache.write().await;
        if let Some(cached) = cache_guard
            .as_ref()
            .filter(|c| c.is_fresh(now, self.config.cache_ttl))
        {
            return cached.status.clone();
        }

        let email = self
            .email
            .ping()
            .await
            .inspect_err(|err| error!("Failed to ping smtp server: {err}"))
            .map_err(|err| TransportUnavailable {
                details: err.to_string(),
            });

        let status = HealthStatus { email };

        cache_guard
            .insert(CachedStatus {
                status,
                timestamp: now,
            })
            .status
            .clone()
    }
}
