//! HTTP health probe used for admission.

use std::time::Duration;

use async_trait::async_trait;
use corelib::{HealthCheck, Server};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes `GET <server>/ping`; healthy iff the response is exactly `200`.
///
/// One attempt per admission, bounded by the client timeout. Redirects are
/// followed with reqwest's default policy.
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    client: reqwest::Client,
}

impl HttpHealthCheck {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Use an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self, server: &Server) -> bool {
        let url = server.ping_url();
        match self.client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!(%url, "health check passed");
                true
            }
            Ok(response) => {
                warn!(%url, status = %response.status(), "health check returned non-200");
                false
            }
            Err(e) => {
                warn!(%url, error = %e, "health check failed");
                false
            }
        }
    }
}
