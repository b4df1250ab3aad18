use std::future::Future;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;
use url::Url;

use crate::http::HttpClient;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait ContactApi: Send + Sync + 'static {
    /// Post a contact message to the relay.
    ///
    /// Fails with [`ContactApiError::Status`] if the relay answers with a
    /// non-success status code.
    fn send(
        &self,
        payload: ContactPayload,
    ) -> impl Future<Output = Result<ContactReply, ContactApiError>> + Send;
}

/// The request body of `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub phone: Option<String>,
}

/// The body of a successful response from the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReply {
    pub ok: bool,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum ContactApiError {
    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct HttpContactApi {
    client: HttpClient,
    endpoint: Url,
}

impl HttpContactApi {
    /// Talk to the relay listening at `base_url`.
    pub fn new(base_url: &Url) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            endpoint: base_url.join("api/contact")?,
        })
    }
}

impl ContactApi for HttpContactApi {
    async fn send(&self, payload: ContactPayload) -> Result<ContactReply, ContactApiError> {
        trace!(endpoint = %self.endpoint, "posting contact message");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .context("Failed to send contact request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContactApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .context("Failed to parse relay response")
            .map_err(Into::into)
    }
}

#[cfg(any(test, feature = "mock"))]
impl MockContactApi {
    pub fn with_send(
        mut self,
        payload: ContactPayload,
        result: Result<ContactReply, ContactApiError>,
    ) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(payload))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
