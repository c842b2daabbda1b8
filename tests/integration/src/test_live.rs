//! Read-only checks against a real organization management account.

#[cfg(test)]
mod tests {
    use org_activator_aws::{build_clients, load_sdk_config};
    use org_activator_core::ActivationConfig;

    use crate::init_tracing;

    #[tokio::test]
    #[ignore = "requires organization management account"]
    async fn test_should_describe_organizations_access() {
        init_tracing();
        let config = ActivationConfig::from_env().expect("ROOT_ID must be set for live tests");
        let sdk_config = load_sdk_config(&config).await;
        let clients = build_clients(&sdk_config, &config);

        let status = clients
            .access
            .describe_organizations_access()
            .await
            .unwrap_or_else(|e| panic!("describe failed: {e}"));

        tracing::info!(%status, "organizations access status");
        assert!(!status.as_str().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires organization management account"]
    async fn test_should_classify_unknown_root_error() {
        init_tracing();
        let mut config = ActivationConfig::from_env().expect("ROOT_ID must be set for live tests");
        config.root_id = org_activator_model::RootId::new("r-0000").unwrap();
        let sdk_config = load_sdk_config(&config).await;
        let clients = build_clients(&sdk_config, &config);

        let err = clients
            .organizations
            .disable_policy_type(&config.root_id, &"TAG_POLICY".parse().unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.operation(), "DisablePolicyType");
        assert_ne!(err.code(), "Unknown");
    }
}
