//! IAM centralized root access.

use async_trait::async_trait;
use org_activator_core::RootAccessApi;
use org_activator_model::RemoteError;

use crate::error::remote_error;

/// [`RootAccessApi`] over the IAM SDK client.
#[derive(Debug, Clone)]
pub struct IamRootAccess {
    client: aws_sdk_iam::Client,
}

impl IamRootAccess {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RootAccessApi for IamRootAccess {
    async fn enable_root_credentials_management(&self) -> Result<(), RemoteError> {
        self.client
            .enable_organizations_root_credentials_management()
            .send()
            .await
            .map_err(|e| remote_error("EnableOrganizationsRootCredentialsManagement", e))?;
        Ok(())
    }

    async fn disable_root_credentials_management(&self) -> Result<(), RemoteError> {
        self.client
            .disable_organizations_root_credentials_management()
            .send()
            .await
            .map_err(|e| remote_error("DisableOrganizationsRootCredentialsManagement", e))?;
        Ok(())
    }

    async fn enable_root_sessions(&self) -> Result<(), RemoteError> {
        self.client
            .enable_organizations_root_sessions()
            .send()
            .await
            .map_err(|e| remote_error("EnableOrganizationsRootSessions", e))?;
        Ok(())
    }

    async fn disable_root_sessions(&self) -> Result<(), RemoteError> {
        self.client
            .disable_organizations_root_sessions()
            .send()
            .await
            .map_err(|e| remote_error("DisableOrganizationsRootSessions", e))?;
        Ok(())
    }
}
