//! In-memory control plane for tests.
//!
//! [`MockControlPlane`] implements all three collaborator traits over a
//! single mutable organization state, so already-applied errors come out of
//! real state rather than scripts. IAM root access calls fail with
//! `ServiceAccessNotEnabledException` until `iam.amazonaws.com` has trusted
//! access, as they do remotely. Failures can be queued per call with
//! [`MockControlPlane::fail_next`]; every call is recorded in order.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use org_activator_model::{AccessStatus, PolicyType, RemoteError, RootId, ServicePrincipal};
use parking_lot::Mutex;

use crate::api::{ActivationClients, OrganizationsAccessApi, OrganizationsApi, RootAccessApi};

const IAM_PRINCIPAL: &str = "iam.amazonaws.com";

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    /// `DescribeOrganizationsAccess`
    DescribeOrganizationsAccess,
    /// `ActivateOrganizationsAccess`
    ActivateOrganizationsAccess,
    /// `DeactivateOrganizationsAccess`
    DeactivateOrganizationsAccess,
    /// `EnableAWSServiceAccess`
    EnableAwsServiceAccess(String),
    /// `DisableAWSServiceAccess`
    DisableAwsServiceAccess(String),
    /// `EnablePolicyType`
    EnablePolicyType(String),
    /// `DisablePolicyType`
    DisablePolicyType(String),
    /// `EnableOrganizationsRootCredentialsManagement`
    EnableRootCredentialsManagement,
    /// `DisableOrganizationsRootCredentialsManagement`
    DisableRootCredentialsManagement,
    /// `EnableOrganizationsRootSessions`
    EnableRootSessions,
    /// `DisableOrganizationsRootSessions`
    DisableRootSessions,
}

/// Organization state held by the mock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockState {
    /// StackSets organizations access is active.
    pub access_enabled: bool,
    /// Access can never be reactivated.
    pub access_disabled_permanently: bool,
    /// Principals with trusted access.
    pub service_principals: BTreeSet<String>,
    /// Policy types enabled on the root.
    pub policy_types: BTreeSet<String>,
    /// Root credentials management is on.
    pub root_credentials_management: bool,
    /// Root sessions are on.
    pub root_sessions: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: MockState,
    calls: Vec<Call>,
    failures: HashMap<Call, VecDeque<RemoteError>>,
    persistent_failures: HashMap<Call, RemoteError>,
    expected_root: Option<String>,
}

/// In-memory stand-in for CloudFormation, Organizations, and IAM.
#[derive(Debug, Default)]
pub struct MockControlPlane {
    inner: Mutex<Inner>,
}

impl MockControlPlane {
    /// Create a control plane whose organizations access starts at `status`.
    #[must_use]
    pub fn new(status: AccessStatus) -> Self {
        let plane = Self::default();
        {
            let mut inner = plane.inner.lock();
            inner.state.access_enabled = status.is_enabled();
            inner.state.access_disabled_permanently =
                matches!(status, AccessStatus::DisabledPermanently);
        }
        plane
    }

    /// Reject policy-type calls that target a different root.
    #[must_use]
    pub fn with_root(self, root: &str) -> Self {
        self.inner.lock().expected_root = Some(root.to_owned());
        self
    }

    /// Clients backed by this control plane.
    #[must_use]
    pub fn clients(self: &Arc<Self>) -> ActivationClients {
        ActivationClients {
            access: Arc::clone(self) as Arc<dyn OrganizationsAccessApi>,
            organizations: Arc::clone(self) as Arc<dyn OrganizationsApi>,
            root_access: Arc::clone(self) as Arc<dyn RootAccessApi>,
        }
    }

    /// Make the next `times` invocations of `call` fail with `error`.
    pub fn fail_next(&self, call: Call, error: RemoteError, times: usize) {
        let mut inner = self.inner.lock();
        let queue = inner.failures.entry(call).or_default();
        queue.extend(std::iter::repeat_n(error, times));
    }

    /// Make every invocation of `call` fail with `error` once queued
    /// failures are used up.
    pub fn fail_always(&self, call: Call, error: RemoteError) {
        self.inner.lock().persistent_failures.insert(call, error);
    }

    /// Mark a policy type as already enabled.
    pub fn seed_policy_type(&self, policy_type: &str) {
        self.inner
            .lock()
            .state
            .policy_types
            .insert(policy_type.to_owned());
    }

    /// Mark a service principal as already having trusted access.
    pub fn seed_service_principal(&self, principal: &str) {
        self.inner
            .lock()
            .state
            .service_principals
            .insert(principal.to_owned());
    }

    /// Snapshot of the organization state.
    #[must_use]
    pub fn state(&self) -> MockState {
        self.inner.lock().state.clone()
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    /// Calls made so far, excluding status reads.
    #[must_use]
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| *c != Call::DescribeOrganizationsAccess)
            .collect()
    }

    /// How many times `call` was made.
    #[must_use]
    pub fn count(&self, call: &Call) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// Forget recorded calls, keeping state and queued failures.
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Record `call`, pop a queued failure if any, otherwise apply `mutate`.
    fn invoke<T>(
        &self,
        call: Call,
        mutate: impl FnOnce(&mut MockState) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call.clone());
        if let Some(error) = inner.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        if let Some(error) = inner.persistent_failures.get(&call) {
            return Err(error.clone());
        }
        mutate(&mut inner.state)
    }

    fn check_root(&self, operation: &'static str, root: &RootId) -> Result<(), RemoteError> {
        match &self.inner.lock().expected_root {
            Some(expected) if expected != root.as_str() => Err(RemoteError::new(
                operation,
                "RootNotFoundException",
                format!("root {root} does not exist"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl OrganizationsAccessApi for MockControlPlane {
    async fn describe_organizations_access(&self) -> Result<AccessStatus, RemoteError> {
        self.invoke(Call::DescribeOrganizationsAccess, |state| {
            Ok(if state.access_enabled {
                AccessStatus::Enabled
            } else if state.access_disabled_permanently {
                AccessStatus::DisabledPermanently
            } else {
                AccessStatus::Disabled
            })
        })
    }

    async fn activate_organizations_access(&self) -> Result<(), RemoteError> {
        self.invoke(Call::ActivateOrganizationsAccess, |state| {
            if state.access_disabled_permanently {
                return Err(RemoteError::new(
                    "ActivateOrganizationsAccess",
                    "InvalidOperationException",
                    "organizations access was disabled permanently",
                ));
            }
            state.access_enabled = true;
            Ok(())
        })
    }

    async fn deactivate_organizations_access(&self) -> Result<(), RemoteError> {
        self.invoke(Call::DeactivateOrganizationsAccess, |state| {
            if !state.access_enabled {
                return Err(RemoteError::new(
                    "DeactivateOrganizationsAccess",
                    "InvalidOperationException",
                    "organizations access is not activated",
                ));
            }
            state.access_enabled = false;
            Ok(())
        })
    }
}

#[async_trait]
impl OrganizationsApi for MockControlPlane {
    async fn enable_aws_service_access(
        &self,
        principal: &ServicePrincipal,
    ) -> Result<(), RemoteError> {
        self.invoke(
            Call::EnableAwsServiceAccess(principal.as_str().to_owned()),
            |state| {
                state.service_principals.insert(principal.as_str().to_owned());
                Ok(())
            },
        )
    }

    async fn disable_aws_service_access(
        &self,
        principal: &ServicePrincipal,
    ) -> Result<(), RemoteError> {
        self.invoke(
            Call::DisableAwsServiceAccess(principal.as_str().to_owned()),
            |state| {
                state.service_principals.remove(principal.as_str());
                Ok(())
            },
        )
    }

    async fn enable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError> {
        self.check_root("EnablePolicyType", root)?;
        self.invoke(
            Call::EnablePolicyType(policy_type.as_str().to_owned()),
            |state| {
                if state.policy_types.insert(policy_type.as_str().to_owned()) {
                    Ok(())
                } else {
                    Err(RemoteError::new(
                        "EnablePolicyType",
                        "PolicyTypeAlreadyEnabledException",
                        "The specified policy type is already enabled.",
                    ))
                }
            },
        )
    }

    async fn disable_policy_type(
        &self,
        root: &RootId,
        policy_type: &PolicyType,
    ) -> Result<(), RemoteError> {
        self.check_root("DisablePolicyType", root)?;
        self.invoke(
            Call::DisablePolicyType(policy_type.as_str().to_owned()),
            |state| {
                if state.policy_types.remove(policy_type.as_str()) {
                    Ok(())
                } else {
                    Err(RemoteError::new(
                        "DisablePolicyType",
                        "PolicyTypeNotEnabledException",
                        "This operation can be performed only for enabled policy types.",
                    ))
                }
            },
        )
    }
}

#[async_trait]
impl RootAccessApi for MockControlPlane {
    async fn enable_root_credentials_management(&self) -> Result<(), RemoteError> {
        self.invoke(Call::EnableRootCredentialsManagement, |state| {
            require_iam_access(state, "EnableOrganizationsRootCredentialsManagement")?;
            state.root_credentials_management = true;
            Ok(())
        })
    }

    async fn disable_root_credentials_management(&self) -> Result<(), RemoteError> {
        self.invoke(Call::DisableRootCredentialsManagement, |state| {
            require_iam_access(state, "DisableOrganizationsRootCredentialsManagement")?;
            state.root_credentials_management = false;
            Ok(())
        })
    }

    async fn enable_root_sessions(&self) -> Result<(), RemoteError> {
        self.invoke(Call::EnableRootSessions, |state| {
            require_iam_access(state, "EnableOrganizationsRootSessions")?;
            state.root_sessions = true;
            Ok(())
        })
    }

    async fn disable_root_sessions(&self) -> Result<(), RemoteError> {
        self.invoke(Call::DisableRootSessions, |state| {
            require_iam_access(state, "DisableOrganizationsRootSessions")?;
            state.root_sessions = false;
            Ok(())
        })
    }
}

/// IAM root access calls need IAM trusted access to the organization.
fn require_iam_access(state: &MockState, operation: &'static str) -> Result<(), RemoteError> {
    if state.service_principals.contains(IAM_PRINCIPAL) {
        Ok(())
    } else {
        Err(RemoteError::new(
            operation,
            "ServiceAccessNotEnabledException",
            "trusted access is not enabled for iam.amazonaws.com",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_should_reject_root_access_without_iam_trusted_access() {
        let plane = MockControlPlane::new(AccessStatus::Disabled);

        let err = plane.enable_root_sessions().await.unwrap_err();
        assert_eq!(err.code(), "ServiceAccessNotEnabledException");
        assert!(!plane.state().root_sessions);

        plane.seed_service_principal(IAM_PRINCIPAL);
        plane.enable_root_sessions().await.unwrap();
        assert!(plane.state().root_sessions);
    }
}
