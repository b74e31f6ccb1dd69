use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::args::{DEFAULT_USER_AGENT, PacerArgs};
use crate::error::{HttpError, TransportError};

/// A response that made it back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs the single GET each dispatched request needs.
///
/// Implementations are shared across every in-flight request and must be
/// safe to call concurrently.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one GET request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response was received.
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl From<&PacerArgs> for TransportSettings {
    fn from(args: &PacerArgs) -> Self {
        Self {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed (for example
    /// when the TLS backend fails to initialize).
    pub fn new(settings: TransportSettings) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
