//! Organization activation custom resource - Lambda `bootstrap` binary.
//!
//! Runs as a Lambda custom runtime. Each invocation carries a CloudFormation
//! custom resource event; the binary runs the activation sequence, uploads
//! the custom resource response to the event's `ResponseURL`, and then
//! acknowledges the invocation with `{}`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ROOT_ID` | *(required)* | Organization root the policy types apply to |
//! | `POLICY_TYPES` | full catalog | Comma-separated policy types |
//! | `SERVICE_PRINCIPALS` | `iam.amazonaws.com,securityhub.amazonaws.com` | Trusted access principals |
//! | `RETRY_BACKOFF_MS` | `100` | Wait after a concurrent-modification rejection |
//! | `POLICY_TYPE_MAX_ATTEMPTS` | *(unbounded)* | Attempt limit per policy type |
//! | `ORGANIZATIONS_REGION` | `us-east-1` | Organizations client region |
//! | `ORGANIZATIONS_ENDPOINT_URL` | `https://organizations.us-east-1.amazonaws.com` | Organizations endpoint, empty = SDK default |
//! | `AWS_SDK_MAX_ATTEMPTS` | `10` | SDK standard retry attempts |
//! | `SLEEP_ON_DELETE_SECONDS` | `120` | Delay before answering a Delete |
//! | `TIMEOUT_MARGIN_MS` | `5000` | Time kept back from the deadline to send the response |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod responder;
mod runtime;

use std::sync::Arc;

use anyhow::{Context, Result};
use org_activator_aws::{build_clients, load_sdk_config};
use org_activator_core::{
    ActivationConfig, ActivationContext, DispatchSettings, InvocationMeta, LifecycleDispatcher,
};
use org_activator_model::CfnRequest;
use serde_json::Value;
use tracing::{Instrument, error, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::responder::CfnResponder;
use crate::runtime::{ErrorPayload, Invocation, RuntimeClient};

/// Initialize the JSON tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .init();

    Ok(())
}

fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Everything the invocation loop needs.
#[derive(Debug)]
struct Runtime {
    api: RuntimeClient,
    dispatcher: LifecycleDispatcher,
    responder: CfnResponder,
    log_stream_name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let api = RuntimeClient::from_env(http.clone())?;

    if let Err(e) = init_tracing(&log_level()) {
        api.report_init_error(&ErrorPayload::new("Runtime.InitError", format!("{e:#}")))
            .await?;
        return Err(e);
    }

    let settings = DispatchSettings::from_env();
    let dispatcher = match initialize().await {
        Ok(context) => LifecycleDispatcher::new(Arc::new(context), settings),
        Err(e) => {
            let cause = format!("{e:#}");
            error!(error = %cause, "cold start failed, every request will be answered FAILED");
            LifecycleDispatcher::failed(&cause, settings)
        }
    };

    let runtime = Runtime {
        api,
        dispatcher,
        responder: CfnResponder::new(http),
        log_stream_name: std::env::var("AWS_LAMBDA_LOG_STREAM_NAME").ok(),
    };
    info!(
        initialized = runtime.dispatcher.is_initialized(),
        sleep_on_delete_secs = settings.sleep_on_delete.as_secs(),
        "runtime ready",
    );

    loop {
        let invocation = runtime.api.next_invocation().await?;
        let span = info_span!(
            "invocation",
            request_id = %invocation.request_id,
            request_type = tracing::field::Empty,
            logical_resource_id = tracing::field::Empty,
        );
        runtime.handle(&invocation).instrument(span).await?;
    }
}

/// Cold start: load configuration, build clients, read the access status.
async fn initialize() -> Result<ActivationContext> {
    let config = ActivationConfig::from_env().context("invalid activation configuration")?;
    let sdk_config = load_sdk_config(&config).await;
    let clients = build_clients(&sdk_config, &config);
    info!(
        root_id = %config.root_id,
        policy_types = config.policy_types.len(),
        service_principals = config.service_principals.len(),
        "loaded activation configuration",
    );
    ActivationContext::initialize(config, clients)
        .await
        .context("failed to read organizations access status")
}

impl Runtime {
    /// Answer one invocation.
    ///
    /// Only Runtime API failures are returned; everything else is reported
    /// to CloudFormation or to the invocation's error endpoint.
    async fn handle(&self, invocation: &Invocation) -> Result<()> {
        let request_id = invocation.request_id.as_str();

        let request = match parse_request(&invocation.body) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %format!("{e:#}"), "received an event that is not a custom resource request");
                return self
                    .api
                    .report_error(request_id, &ErrorPayload::new("InvalidEvent", format!("{e:#}")))
                    .await;
            }
        };

        let span = tracing::Span::current();
        span.record("request_type", request.request_type.as_str());
        span.record("logical_resource_id", request.logical_resource_id.as_str());

        let meta = InvocationMeta {
            request_id: request_id.to_owned(),
            deadline: invocation.deadline(),
            log_stream_name: self.log_stream_name.clone(),
        };
        let response = self.dispatcher.handle(&request, &meta).await;

        match self.responder.send(&request.response_url, &response).await {
            Ok(()) => self.api.respond(request_id, &serde_json::json!({})).await,
            Err(e) => {
                error!(error = %format!("{e:#}"), "CloudFormation response was not delivered");
                self.api
                    .report_error(
                        request_id,
                        &ErrorPayload::new("ResponseDeliveryFailed", format!("{e:#}")),
                    )
                    .await
            }
        }
    }
}

/// Parse the event and log it without its pre-signed `ResponseURL`.
fn parse_request(body: &str) -> Result<CfnRequest> {
    let event: Value = serde_json::from_str(body).context("event is not valid JSON")?;
    info!(event = %redacted(&event), "received event");
    serde_json::from_value(event).context("event is not a CloudFormation custom resource request")
}

fn redacted(event: &Value) -> Value {
    let mut event = event.clone();
    if let Some(fields) = event.as_object_mut() {
        fields.remove("ResponseURL");
    }
    event
}
