//! Delivery of custom resource responses to CloudFormation.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use org_activator_model::CfnResponse;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

/// Uploads a [`CfnResponse`] to the pre-signed `ResponseURL`.
///
/// The body is sent with `PUT` and an empty `Content-Type`; the pre-signed
/// S3 URL is signed without one and rejects anything else.
#[derive(Debug, Clone)]
pub struct CfnResponder {
    http: reqwest::Client,
    attempts: u32,
    base_backoff: Duration,
}

impl CfnResponder {
    /// Attempts made before giving up on a response.
    pub const DEFAULT_ATTEMPTS: u32 = 5;

    /// Wait before the first retry; doubled on each subsequent one.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

    /// Responder with the default retry schedule.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            attempts: Self::DEFAULT_ATTEMPTS,
            base_backoff: Self::DEFAULT_BACKOFF,
        }
    }

    /// Override the first retry delay.
    #[must_use]
    pub fn with_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Upload `response`, retrying transport failures and error statuses.
    pub async fn send(&self, response_url: &str, response: &CfnResponse) -> Result<()> {
        let body = serde_json::to_vec(response).context("failed to serialize response")?;
        let mut last_error = anyhow!("no attempt made");

        for attempt in 1..=self.attempts {
            match self.put(response_url, body.clone()).await {
                Ok(()) => {
                    info!(attempt, status = ?response.status, "sent response to CloudFormation");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %format!("{e:#}"), "failed to send response");
                    last_error = e;
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.backoff_for(attempt)).await;
            }
        }

        Err(last_error.context(format!(
            "giving up on CloudFormation response after {} attempts",
            self.attempts
        )))
    }

    async fn put(&self, response_url: &str, body: Vec<u8>) -> Result<()> {
        self.http
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Delay after failed attempt number `attempt` (1-based).
    fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}
