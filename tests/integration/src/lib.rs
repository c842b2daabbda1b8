//! End-to-end tests for the organization activator.
//!
//! Lifecycle tests drive [`LifecycleDispatcher`] against the in-memory
//! control plane and run with a plain `cargo test`. Tests that talk to a real
//! organization management account are marked `#[ignore]`.
//!
//! Run them with:
//! ```text
//! ROOT_ID=r-xxxx cargo test -p org-activator-integration -- --ignored
//! ```

use std::sync::{Arc, Once};
use std::time::Duration;

use org_activator_core::mock::MockControlPlane;
use org_activator_core::{
    ActivationConfig, ActivationContext, DispatchSettings, InvocationMeta, LifecycleDispatcher,
};
use org_activator_model::{CfnRequest, PolicyType, RequestType, RootId, ServicePrincipal};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Activation config for `root` with the given policy types and the default
/// service principals.
#[must_use]
pub fn config(root: &str, policy_types: &[&str]) -> ActivationConfig {
    ActivationConfig::builder()
        .root_id(RootId::new(root).unwrap())
        .policy_types(
            policy_types
                .iter()
                .map(|p| PolicyType::new(*p).unwrap())
                .collect(),
        )
        .service_principals(ServicePrincipal::default_list())
        .retry_backoff_ms(1)
        .build()
}

/// Dispatch settings that never sleep before answering a Delete.
#[must_use]
pub fn settings() -> DispatchSettings {
    DispatchSettings::builder()
        .sleep_on_delete(Duration::ZERO)
        .build()
}

/// Simulate a Lambda cold start: read the status and build a dispatcher.
pub async fn cold_start(
    plane: &Arc<MockControlPlane>,
    config: ActivationConfig,
) -> LifecycleDispatcher {
    init_tracing();
    let context = ActivationContext::initialize(config, plane.clients())
        .await
        .unwrap_or_else(|e| panic!("cold start failed: {e}"));
    LifecycleDispatcher::new(Arc::new(context), settings())
}

/// A CloudFormation event of `request_type`.
#[must_use]
pub fn event(request_type: RequestType, physical_resource_id: Option<&str>) -> CfnRequest {
    let mut event = serde_json::json!({
        "RequestType": request_type.as_str(),
        "ResponseURL": "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/signed",
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/org-activation/1",
        "RequestId": format!("{}-request", request_type.as_str().to_lowercase()),
        "ResourceType": "Custom::OrganizationActivation",
        "LogicalResourceId": "OrganizationActivation",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:activator"
        }
    });
    if let Some(id) = physical_resource_id {
        event["PhysicalResourceId"] = serde_json::json!(id);
    }
    serde_json::from_value(event).unwrap()
}

/// Invocation metadata with a log stream and no deadline.
#[must_use]
pub fn invocation() -> InvocationMeta {
    InvocationMeta {
        request_id: "lambda-request".to_owned(),
        deadline: None,
        log_stream_name: Some("2026/10/19/[$LATEST]0123456789abcdef".to_owned()),
    }
}

mod test_lifecycle;
mod test_live;
