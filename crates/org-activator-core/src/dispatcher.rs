//! CloudFormation lifecycle dispatch.
//!
//! [`LifecycleDispatcher`] routes a custom resource request to the sequencer
//! and always produces a [`CfnResponse`]: success, a remote failure, a
//! deadline overrun, or a cold-start failure are all reported to
//! CloudFormation instead of being raised, so the stack never waits on a
//! response that will not come.

use std::sync::Arc;
use std::time::Duration;

use org_activator_model::{CfnRequest, CfnResponse, RequestType, ResponseStatus};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::DispatchSettings;
use crate::context::ActivationContext;
use crate::error::{ActivationError, ActivationResult};
use crate::sequencer::{ActivationReport, ActivationSequencer};

/// Upper bound on the `Reason` text sent to CloudFormation.
pub const MAX_REASON_CHARS: usize = 1024;

/// Per-invocation facts supplied by the runtime.
#[derive(Debug, Clone, Default)]
pub struct InvocationMeta {
    /// Lambda request id.
    pub request_id: String,
    /// When the runtime will kill the invocation.
    pub deadline: Option<Instant>,
    /// CloudWatch log stream the function writes to.
    pub log_stream_name: Option<String>,
}

/// Answers CloudFormation lifecycle requests.
#[derive(Debug)]
pub struct LifecycleDispatcher {
    context: Result<Arc<ActivationContext>, String>,
    settings: DispatchSettings,
}

impl LifecycleDispatcher {
    /// Dispatcher over a successfully initialized context.
    #[must_use]
    pub fn new(context: Arc<ActivationContext>, settings: DispatchSettings) -> Self {
        Self {
            context: Ok(context),
            settings,
        }
    }

    /// Dispatcher for a process whose cold start failed.
    ///
    /// Every request is answered `FAILED` with `cause` as the reason.
    #[must_use]
    pub fn failed(cause: &dyn std::fmt::Display, settings: DispatchSettings) -> Self {
        Self {
            context: Err(cause.to_string()),
            settings,
        }
    }

    /// Whether cold-start initialization succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.context.is_ok()
    }

    /// Handle one request and build the response to upload.
    pub async fn handle(&self, request: &CfnRequest, invocation: &InvocationMeta) -> CfnResponse {
        let physical_resource_id = physical_resource_id(request, invocation);

        let outcome = match &self.context {
            Ok(context) => self.run_with_deadline(context, request, invocation).await,
            Err(cause) => Err(ActivationError::Initialization(cause.clone())),
        };

        let response = match outcome {
            Ok(report) => {
                let mut response = CfnResponse::for_request(
                    request,
                    ResponseStatus::Success,
                    physical_resource_id,
                    success_reason(invocation),
                );
                if let Some(report) = report {
                    response.data = report.to_data();
                }
                info!(
                    request_type = %request.request_type,
                    invocation = %invocation.request_id,
                    "lifecycle request succeeded",
                );
                response
            }
            Err(e) => {
                error!(
                    request_type = %request.request_type,
                    invocation = %invocation.request_id,
                    error = %e,
                    "lifecycle request failed",
                );
                CfnResponse::for_request(
                    request,
                    ResponseStatus::Failed,
                    physical_resource_id,
                    failure_reason(&e, invocation),
                )
            }
        };

        if request.request_type == RequestType::Delete {
            self.sleep_before_delete_response(invocation).await;
        }
        response
    }

    async fn run_with_deadline(
        &self,
        context: &Arc<ActivationContext>,
        request: &CfnRequest,
        invocation: &InvocationMeta,
    ) -> ActivationResult<Option<ActivationReport>> {
        let run = run_request(Arc::clone(context), request.request_type);
        match self.budget(invocation) {
            Some(budget) => tokio::time::timeout(budget, run)
                .await
                .map_err(|_| ActivationError::TimedOut(budget))?,
            None => run.await,
        }
    }

    /// Time the handler may run before the response must go out.
    fn budget(&self, invocation: &InvocationMeta) -> Option<Duration> {
        invocation.deadline.map(|deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .saturating_sub(self.settings.timeout_margin)
        })
    }

    async fn sleep_before_delete_response(&self, invocation: &InvocationMeta) {
        let mut wait = self.settings.sleep_on_delete;
        if let Some(budget) = self.budget(invocation) {
            wait = wait.min(budget);
        }
        if wait.is_zero() {
            return;
        }
        info!(
            wait_secs = wait.as_secs(),
            "waiting before answering delete so logs can flush"
        );
        tokio::time::sleep(wait).await;
    }
}

async fn run_request(
    context: Arc<ActivationContext>,
    request_type: RequestType,
) -> ActivationResult<Option<ActivationReport>> {
    let sequencer = ActivationSequencer::new(context);
    match request_type {
        RequestType::Create => Ok(Some(sequencer.create().await?)),
        RequestType::Delete => Ok(Some(sequencer.delete().await?)),
        RequestType::Update => {
            info!("update has no effect on organization features");
            Ok(None)
        }
    }
}

/// Keep the id CloudFormation already knows; otherwise name the resource
/// after the log stream that created it.
fn physical_resource_id(request: &CfnRequest, invocation: &InvocationMeta) -> String {
    request
        .physical_resource_id
        .clone()
        .or_else(|| invocation.log_stream_name.clone())
        .unwrap_or_else(|| format!("{}-{}", request.logical_resource_id, request.request_id))
}

fn success_reason(invocation: &InvocationMeta) -> String {
    invocation
        .log_stream_name
        .as_ref()
        .map(|stream| format!("See the details in CloudWatch Log Stream: {stream}"))
        .unwrap_or_default()
}

fn failure_reason(error: &ActivationError, invocation: &InvocationMeta) -> String {
    let reason = match &invocation.log_stream_name {
        Some(stream) => format!("{error} (see CloudWatch Log Stream: {stream})"),
        None => error.to_string(),
    };
    truncate_reason(reason)
}

fn truncate_reason(reason: String) -> String {
    if reason.chars().count() <= MAX_REASON_CHARS {
        return reason;
    }
    warn!(len = reason.len(), "truncating failure reason");
    let mut truncated: String = reason.chars().take(MAX_REASON_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}
