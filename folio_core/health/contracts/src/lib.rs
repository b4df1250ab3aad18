use std::future::Future;

use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait HealthService: Send + Sync + 'static {
    fn get_status(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Whether the smtp server is reachable and accepts our credentials.
    pub email: Result<(), TransportUnavailable>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.email.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SMTP not verified: {details}")]
pub struct TransportUnavailable {
    pub details: String,
}

#[cfg(feature = "mock")]
impl MockHealthService {
    pub fn with_get_status(mut self, status: HealthStatus) -> Self {
        self.expect_get_status()
            .once()
            .return_once(move || Box::pin(std::future::ready(status)));
        self
    }
}
