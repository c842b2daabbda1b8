//! Process-wide activation context.

use org_activator_model::{AccessStatus, RemoteError};
use tracing::info;

use crate::api::ActivationClients;
use crate::config::ActivationConfig;

/// Everything an invocation needs, built once at cold start.
///
/// The organizations access status is read during [`initialize`](Self::initialize)
/// and not refreshed afterwards; a warm container keeps answering from the
/// value it saw at startup.
#[derive(Debug)]
pub struct ActivationContext {
    config: ActivationConfig,
    clients: ActivationClients,
    status: AccessStatus,
}

impl ActivationContext {
    /// Read the current organizations access status and build the context.
    ///
    /// # Errors
    /// Returns the remote error if the status cannot be read.
    pub async fn initialize(
        config: ActivationConfig,
        clients: ActivationClients,
    ) -> Result<Self, RemoteError> {
        let status = clients.access.describe_organizations_access().await?;
        info!(status = %status, root_id = %config.root_id, "read organizations access status");
        Ok(Self::new(config, clients, status))
    }

    /// Build a context from an already known status.
    #[must_use]
    pub fn new(config: ActivationConfig, clients: ActivationClients, status: AccessStatus) -> Self {
        Self {
            config,
            clients,
            status,
        }
    }

    /// Activation configuration.
    #[must_use]
    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    /// Remote clients.
    #[must_use]
    pub fn clients(&self) -> &ActivationClients {
        &self.clients
    }

    /// Organizations access status read at cold start.
    #[must_use]
    pub fn status(&self) -> &AccessStatus {
        &self.status
    }
}
