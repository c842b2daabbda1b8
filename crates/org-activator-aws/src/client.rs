//! SDK configuration and client construction.

use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use org_activator_core::{ActivationClients, ActivationConfig};
use tracing::info;

use crate::cloudformation::CloudFormationAccess;
use crate::iam::IamRootAccess;
use crate::organizations::OrganizationsClient;

/// Load the shared SDK configuration from the Lambda environment.
///
/// Every client uses the standard retry strategy with
/// `config.sdk_max_attempts` attempts per call.
pub async fn load_sdk_config(config: &ActivationConfig) -> SdkConfig {
    let max_attempts = config.sdk_max_attempts.max(1);
    aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
        .load()
        .await
}

/// Organizations client configuration pinned to the configured region and
/// endpoint.
#[must_use]
pub fn organizations_config(sdk: &SdkConfig, config: &ActivationConfig) -> aws_sdk_organizations::Config {
    let mut builder = aws_sdk_organizations::config::Builder::from(sdk)
        .region(Region::new(config.organizations_region.clone()));
    if let Some(endpoint) = &config.organizations_endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }
    builder.build()
}

/// Build the three remote clients the sequencer drives.
#[must_use]
pub fn build_clients(sdk: &SdkConfig, config: &ActivationConfig) -> ActivationClients {
    info!(
        region = %config.organizations_region,
        endpoint = config.organizations_endpoint_url.as_deref().unwrap_or("default"),
        max_attempts = config.sdk_max_attempts,
        "building AWS clients",
    );

    let cloudformation = aws_sdk_cloudformation::Client::new(sdk);
    let organizations =
        aws_sdk_organizations::Client::from_conf(organizations_config(sdk, config));
    let iam = aws_sdk_iam::Client::new(sdk);

    ActivationClients {
        access: Arc::new(CloudFormationAccess::new(cloudformation)),
        organizations: Arc::new(OrganizationsClient::new(organizations)),
        root_access: Arc::new(IamRootAccess::new(iam)),
    }
}
