//! CloudFormation StackSets organizations access.

use async_trait::async_trait;
use aws_sdk_cloudformation::types::{CallAs, OrganizationStatus};
use org_activator_core::OrganizationsAccessApi;
use org_activator_model::{AccessStatus, RemoteError};

use crate::error::remote_error;

/// [`OrganizationsAccessApi`] over the CloudFormation SDK client.
#[derive(Debug, Clone)]
pub struct CloudFormationAccess {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationAccess {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganizationsAccessApi for CloudFormationAccess {
    async fn describe_organizations_access(&self) -> Result<AccessStatus, RemoteError> {
        let output = self
            .client
            .describe_organizations_access()
            .call_as(CallAs::SelfValue)
            .send()
            .await
            .map_err(|e| remote_error("DescribeOrganizationsAccess", e))?;

        access_status(output.status())
    }

    async fn activate_organizations_access(&self) -> Result<(), RemoteError> {
        self.client
            .activate_organizations_access()
            .send()
            .await
            .map_err(|e| remote_error("ActivateOrganizationsAccess", e))?;
        Ok(())
    }

    async fn deactivate_organizations_access(&self) -> Result<(), RemoteError> {
        self.client
            .deactivate_organizations_access()
            .send()
            .await
            .map_err(|e| remote_error("DeactivateOrganizationsAccess", e))?;
        Ok(())
    }
}

fn access_status(status: Option<&OrganizationStatus>) -> Result<AccessStatus, RemoteError> {
    status
        .map(|status| AccessStatus::from(status.as_str()))
        .ok_or_else(|| {
            RemoteError::unclassified(
                "DescribeOrganizationsAccess",
                "response did not include an organizations access status",
            )
        })
}
