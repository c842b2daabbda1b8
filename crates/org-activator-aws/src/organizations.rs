//! AWS Organizations trusted access and policy types.

use async_trait::async_trait;
use aws_sdk_organizations::types::PolicyType as SdkPolicyType;
use org_activator_core::OrganizationsApi;
use org_activator_model::{PolicyType, RemoteError, RootId, ServicePrincipal};

use crate::error::remote_error;

/// [`OrganizationsApi`] over the Organizations SDK client.
///
/// Policy type names are passed through [`SdkPolicyType::from`], so names the
/// SDK does not know yet still reach the service verbatim.
#[derive(Debug, Clone)]
pub struct OrganizationsClient {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsClient {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: aws_sdk_organizations::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrganizationsApi for OrganizationsClient {
    async fn enable_aws_service_access(
        &self,
        principal: &ServicePrincipal,
    ) -> Result<(), RemoteError> {
        self.client
            .enable_aws_service_access()
            .service_principal(principal.as_str())
            .send()
            .await
            .map_err(|e| remote_error("EnableAWSServiceAccess", e))?;
        Ok(())
    }

    async fn disable_aws_service_access(
        &self,
        principal: &ServicePrincipal,
    ) -> Result<(), RemoteError> {
        self.client
            .disable_aws_service_access()
            .service_principal(principal.as_str())
            .send()
            .await
            .map_err(|e| remote_error("DisableAWSServiceAccess", e))?;
        Ok(())
    }

    async fn enable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError> {
        self.client
            .enable_policy_type()
            .root_id(root.as_str())
            .policy_type(SdkPolicyType::from(policy_type.as_str()))
            .send()
            .await
            .map_err(|e| remote_error("EnablePolicyType", e))?;
        Ok(())
    }

    async fn disable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError> {
        self.client
            .disable_policy_type()
            .root_id(root.as_str())
            .policy_type(SdkPolicyType::from(policy_type.as_str()))
            .send()
            .await
            .map_err(|e| remote_error("DisablePolicyType", e))?;
        Ok(())
    }
}
