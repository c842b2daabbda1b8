//! Create/update/delete lifecycle against the in-memory control plane.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use org_activator_core::mock::{Call, MockControlPlane};
    use org_activator_model::{AccessStatus, RemoteError, RequestType, ResponseStatus};

    use crate::{cold_start, config, event, invocation};

    const ROOT: &str = "r-abc1";

    #[tokio::test]
    async fn test_should_enable_everything_on_create() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled).with_root(ROOT));
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY", "BACKUP_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Create, None), &invocation())
            .await;

        assert!(response.is_success(), "create failed: {}", response.reason);
        assert_eq!(
            response.physical_resource_id,
            "2026/10/19/[$LATEST]0123456789abcdef"
        );
        assert_eq!(response.data["State"], "ENABLED");
        assert_eq!(response.data["PolicyTypes"], 2);
        assert_eq!(response.data["ServicePrincipals"], 2);

        let state = plane.state();
        assert!(state.access_enabled);
        assert!(state.policy_types.contains("TAG_POLICY"));
        assert!(state.policy_types.contains("BACKUP_POLICY"));
        assert!(state.service_principals.contains("iam.amazonaws.com"));
        assert!(state.service_principals.contains("securityhub.amazonaws.com"));
        assert!(state.root_credentials_management);
        assert!(state.root_sessions);
    }

    #[tokio::test]
    async fn test_should_apply_create_steps_in_order() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY", "BACKUP_POLICY"])).await;

        dispatcher
            .handle(&event(RequestType::Create, None), &invocation())
            .await;

        assert_eq!(
            plane.mutations(),
            vec![
                Call::ActivateOrganizationsAccess,
                Call::EnableAwsServiceAccess("iam.amazonaws.com".to_owned()),
                Call::EnableAwsServiceAccess("securityhub.amazonaws.com".to_owned()),
                Call::EnablePolicyType("TAG_POLICY".to_owned()),
                Call::EnablePolicyType("BACKUP_POLICY".to_owned()),
                Call::EnableRootCredentialsManagement,
                Call::EnableRootSessions,
            ]
        );
    }

    #[tokio::test]
    async fn test_should_converge_when_create_runs_again() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        let config = config(ROOT, &["TAG_POLICY", "BACKUP_POLICY"]);

        let first = cold_start(&plane, config.clone()).await;
        assert!(
            first
                .handle(&event(RequestType::Create, None), &invocation())
                .await
                .is_success()
        );
        let after_first = plane.state();
        plane.clear_calls();

        // A new container reads the access status again.
        let second = cold_start(&plane, config).await;
        let response = second
            .handle(&event(RequestType::Create, None), &invocation())
            .await;

        assert!(response.is_success(), "rerun failed: {}", response.reason);
        assert_eq!(plane.state(), after_first);
        assert_eq!(plane.count(&Call::ActivateOrganizationsAccess), 0);
        assert_eq!(plane.count(&Call::EnablePolicyType("TAG_POLICY".to_owned())), 1);
    }

    #[tokio::test]
    async fn test_should_disable_everything_on_delete() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        let config = config(ROOT, &["TAG_POLICY", "BACKUP_POLICY"]);
        cold_start(&plane, config.clone())
            .await
            .handle(&event(RequestType::Create, None), &invocation())
            .await;
        plane.clear_calls();

        let dispatcher = cold_start(&plane, config).await;
        let response = dispatcher
            .handle(&event(RequestType::Delete, Some("phys-1")), &invocation())
            .await;

        assert!(response.is_success(), "delete failed: {}", response.reason);
        assert_eq!(response.physical_resource_id, "phys-1");
        assert_eq!(response.data["State"], "DISABLED");
        assert_eq!(plane.state(), Default::default());
        assert_eq!(
            plane.mutations(),
            vec![
                Call::DeactivateOrganizationsAccess,
                Call::DisablePolicyType("TAG_POLICY".to_owned()),
                Call::DisablePolicyType("BACKUP_POLICY".to_owned()),
                Call::DisableRootSessions,
                Call::DisableRootCredentialsManagement,
                Call::DisableAwsServiceAccess("iam.amazonaws.com".to_owned()),
                Call::DisableAwsServiceAccess("securityhub.amazonaws.com".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_should_succeed_when_deleting_nothing() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Delete, Some("phys-1")), &invocation())
            .await;

        assert!(response.is_success(), "delete failed: {}", response.reason);
        assert_eq!(response.data["State"], "DISABLED");
        assert_eq!(response.data["RemoteCalls"], 5);
        assert_eq!(plane.count(&Call::DeactivateOrganizationsAccess), 0);
        // IAM answers the root access calls with ServiceAccessNotEnabled.
        assert_eq!(
            plane.mutations(),
            vec![
                Call::DisablePolicyType("TAG_POLICY".to_owned()),
                Call::DisableRootSessions,
                Call::DisableRootCredentialsManagement,
                Call::DisableAwsServiceAccess("iam.amazonaws.com".to_owned()),
                Call::DisableAwsServiceAccess("securityhub.amazonaws.com".to_owned()),
            ]
        );
        assert_eq!(plane.state(), Default::default());
    }

    #[tokio::test]
    async fn test_should_delete_after_create_failed_at_first_step() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        plane.fail_next(
            Call::ActivateOrganizationsAccess,
            RemoteError::new("ActivateOrganizationsAccess", "AccessDeniedException", "denied"),
            1,
        );
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let create = dispatcher
            .handle(&event(RequestType::Create, None), &invocation())
            .await;
        assert_eq!(create.status, ResponseStatus::Failed);

        // CloudFormation rolls back with a Delete for the failed resource.
        let delete = dispatcher
            .handle(
                &event(RequestType::Delete, Some(&create.physical_resource_id)),
                &invocation(),
            )
            .await;

        assert!(delete.is_success(), "rollback failed: {}", delete.reason);
        assert_eq!(delete.physical_resource_id, create.physical_resource_id);
        assert_eq!(plane.state(), Default::default());
    }

    #[tokio::test]
    async fn test_should_fail_delete_when_root_access_call_is_denied() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Enabled));
        plane.seed_service_principal("iam.amazonaws.com");
        plane.fail_next(
            Call::DisableRootSessions,
            RemoteError::new("DisableOrganizationsRootSessions", "AccessDeniedException", "denied"),
            1,
        );
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Delete, Some("phys-1")), &invocation())
            .await;

        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.reason.contains("AccessDeniedException"));
        assert_eq!(plane.count(&Call::DisableRootCredentialsManagement), 0);
        assert!(plane.state().service_principals.contains("iam.amazonaws.com"));
    }

    #[tokio::test]
    async fn test_should_leave_organization_untouched_on_update() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Disabled));
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Update, Some("phys-1")), &invocation())
            .await;

        assert!(response.is_success());
        assert!(plane.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_should_wait_out_policy_type_contention() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Enabled));
        plane.fail_next(
            Call::EnablePolicyType("TAG_POLICY".to_owned()),
            RemoteError::new(
                "EnablePolicyType",
                "ConcurrentModificationException",
                "conflicts with another attempt",
            ),
            3,
        );
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Create, None), &invocation())
            .await;

        assert!(response.is_success(), "create failed: {}", response.reason);
        assert_eq!(plane.count(&Call::EnablePolicyType("TAG_POLICY".to_owned())), 4);
        assert!(plane.state().policy_types.contains("TAG_POLICY"));
    }

    #[tokio::test]
    async fn test_should_fail_create_for_unknown_root() {
        let plane = Arc::new(MockControlPlane::new(AccessStatus::Enabled).with_root("r-zzzz"));
        let dispatcher = cold_start(&plane, config(ROOT, &["TAG_POLICY"])).await;

        let response = dispatcher
            .handle(&event(RequestType::Create, None), &invocation())
            .await;

        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.reason.contains("RootNotFoundException"));
        assert!(response.reason.contains("2026/10/19/[$LATEST]0123456789abcdef"));
        assert!(!plane.state().root_sessions);
    }
}
