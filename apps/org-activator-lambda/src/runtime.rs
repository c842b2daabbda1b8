//! Lambda Runtime API client.
//!
//! The function ships as a custom runtime (`bootstrap`), so it polls
//! `AWS_LAMBDA_RUNTIME_API` for events and posts results back itself.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use reqwest::header::HeaderMap;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
const FUNCTION_ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// One event handed out by the runtime.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Lambda request id, used to answer this event.
    pub request_id: String,
    /// Wall-clock deadline in milliseconds since the Unix epoch.
    pub deadline_ms: Option<u64>,
    /// Raw event payload.
    pub body: String,
}

impl Invocation {
    /// Deadline as a monotonic instant.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        let deadline_ms = self.deadline_ms?;
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Some(Instant::now() + remaining(deadline_ms, now_ms))
    }
}

/// Error body accepted by the `/error` endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Human readable message.
    pub error_message: String,
    /// Short machine readable category.
    pub error_type: String,
}

impl ErrorPayload {
    /// Build a payload from an error type and message.
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            error_type: error_type.into(),
        }
    }
}

/// HTTP client for the Lambda Runtime API.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    http: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    /// Client for the runtime API at `AWS_LAMBDA_RUNTIME_API`.
    pub fn from_env(http: reqwest::Client) -> Result<Self> {
        let address = std::env::var("AWS_LAMBDA_RUNTIME_API")
            .context("AWS_LAMBDA_RUNTIME_API is not set; not running inside Lambda")?;
        Ok(Self::new(http, &address))
    }

    /// Client for the runtime API at `address` (`host:port`).
    #[must_use]
    pub fn new(http: reqwest::Client, address: &str) -> Self {
        Self {
            http,
            base_url: format!("http://{address}/{API_VERSION}/runtime"),
        }
    }

    /// Block until the next event is available.
    pub async fn next_invocation(&self) -> Result<Invocation> {
        let response = self
            .http
            .get(format!("{}/invocation/next", self.base_url))
            .send()
            .await
            .context("failed to poll for the next invocation")?
            .error_for_status()
            .context("runtime API rejected the next invocation poll")?;

        let (request_id, deadline_ms) = parse_invocation_headers(response.headers())?;
        let body = response
            .text()
            .await
            .context("failed to read invocation payload")?;
        debug!(request_id, ?deadline_ms, "received invocation");

        Ok(Invocation {
            request_id,
            deadline_ms,
            body,
        })
    }

    /// Report a successful invocation result.
    pub async fn respond<T: Serialize + ?Sized>(&self, request_id: &str, result: &T) -> Result<()> {
        self.http
            .post(self.invocation_url(request_id, "response"))
            .json(result)
            .send()
            .await
            .context("failed to post invocation response")?
            .error_for_status()
            .context("runtime API rejected the invocation response")?;
        Ok(())
    }

    /// Report a failed invocation.
    pub async fn report_error(&self, request_id: &str, error: &ErrorPayload) -> Result<()> {
        self.post_error(&self.invocation_url(request_id, "error"), error)
            .await
            .context("failed to post invocation error")
    }

    /// Report a failure that prevents the runtime from serving any event.
    pub async fn report_init_error(&self, error: &ErrorPayload) -> Result<()> {
        self.post_error(&format!("{}/init/error", self.base_url), error)
            .await
            .context("failed to post init error")
    }

    async fn post_error(&self, url: &str, error: &ErrorPayload) -> Result<()> {
        self.http
            .post(url)
            .header(FUNCTION_ERROR_TYPE_HEADER, "Unhandled")
            .json(error)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn invocation_url(&self, request_id: &str, action: &str) -> String {
        format!("{}/invocation/{request_id}/{action}", self.base_url)
    }
}

fn parse_invocation_headers(headers: &HeaderMap) -> Result<(String, Option<u64>)> {
    let Some(request_id) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        bail!("invocation is missing the {REQUEST_ID_HEADER} header");
    };

    let deadline_ms = headers
        .get(DEADLINE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    Ok((request_id.to_owned(), deadline_ms))
}

fn remaining(deadline_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(deadline_ms.saturating_sub(now_ms))
}
