//! Remote collaborator traits.
//!
//! Each trait mirrors the slice of one AWS service the sequencer consumes.
//! Implementations report failures as [`RemoteError`] with the service error
//! code already classified, so the sequencer never sees SDK types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use org_activator_model::{AccessStatus, PolicyType, RemoteError, RootId, ServicePrincipal};

/// CloudFormation StackSets organizations access.
#[async_trait]
pub trait OrganizationsAccessApi: Send + Sync + fmt::Debug {
    /// Current activation status (`DescribeOrganizationsAccess`, called as self).
    async fn describe_organizations_access(&self) -> Result<AccessStatus, RemoteError>;

    /// `ActivateOrganizationsAccess`.
    async fn activate_organizations_access(&self) -> Result<(), RemoteError>;

    /// `DeactivateOrganizationsAccess`.
    async fn deactivate_organizations_access(&self) -> Result<(), RemoteError>;
}

/// AWS Organizations trusted access and policy types.
#[async_trait]
pub trait OrganizationsApi: Send + Sync + fmt::Debug {
    /// `EnableAWSServiceAccess`.
    async fn enable_aws_service_access(&self, principal: &ServicePrincipal)
    -> Result<(), RemoteError>;

    /// `DisableAWSServiceAccess`.
    async fn disable_aws_service_access(
        &self,
        principal: &ServicePrincipal,
    ) -> Result<(), RemoteError>;

    /// `EnablePolicyType` on the given root.
    async fn enable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError>;

    /// `DisablePolicyType` on the given root.
    async fn disable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError>;
}

/// IAM centralized root access.
#[async_trait]
pub trait RootAccessApi: Send + Sync + fmt::Debug {
    /// `EnableOrganizationsRootCredentialsManagement`.
    async fn enable_root_credentials_management(&self) -> Result<(), RemoteError>;

    /// `DisableOrganizationsRootCredentialsManagement`.
    async fn disable_root_credentials_management(&self) -> Result<(), RemoteError>;

    /// `EnableOrganizationsRootSessions`.
    async fn enable_root_sessions(&self) -> Result<(), RemoteError>;

    /// `DisableOrganizationsRootSessions`.
    async fn disable_root_sessions(&self) -> Result<(), RemoteError>;
}

/// The set of remote clients, constructed once per process.
#[derive(Debug, Clone)]
pub struct ActivationClients {
    /// CloudFormation organizations access.
    pub access: Arc<dyn OrganizationsAccessApi>,
    /// Organizations trusted access and policy types.
    pub organizations: Arc<dyn OrganizationsApi>,
    /// IAM root access management.
    pub root_access: Arc<dyn RootAccessApi>,
}
