//! Activation sequencer.
//!
//! [`ActivationSequencer::create`] turns on, in order:
//!
//! 1. CloudFormation StackSets organizations access (skipped if the cold-start
//!    status already says `ENABLED`),
//! 2. trusted access for every configured service principal,
//! 3. every configured policy type on the organization root,
//! 4. IAM root credentials management, then root sessions.
//!
//! [`ActivationSequencer::delete`] reverses it: organizations access, policy
//! types, root sessions, root credentials management, and finally trusted
//! access. Every step is idempotent, so a failed run is repaired by running
//! it again; nothing already applied is rolled back.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use org_activator_model::{PolicyType, RemoteError, RemoteErrorKind, ServicePrincipal};
use tracing::{debug, info, warn};

use crate::context::ActivationContext;
use crate::retry::{Convergence, retry_until_converged};

/// Which way a run moves the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Create: turn features on.
    Enable,
    /// Delete: turn features off.
    Disable,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        })
    }
}

/// One remotely toggled feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// CloudFormation StackSets organizations access.
    OrganizationsAccess,
    /// Trusted access for a service principal.
    ServiceAccess(ServicePrincipal),
    /// A policy type on the organization root.
    PolicyType(PolicyType),
    /// IAM centralized root credentials management.
    RootCredentialsManagement,
    /// IAM centralized root sessions.
    RootSessions,
}

impl Step {
    fn progressive(&self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Self::OrganizationsAccess, Direction::Enable) => "Activating",
            (Self::OrganizationsAccess, Direction::Disable) => "Deactivating",
            (_, Direction::Enable) => "Enabling",
            (_, Direction::Disable) => "Disabling",
        }
    }

    fn past(&self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Self::OrganizationsAccess, Direction::Enable) => "Activated",
            (Self::OrganizationsAccess, Direction::Disable) => "Deactivated",
            (_, Direction::Enable) => "Enabled",
            (_, Direction::Disable) => "Disabled",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrganizationsAccess => f.write_str("organizations access"),
            Self::ServiceAccess(principal) => write!(f, "AWS service access for {principal}"),
            Self::PolicyType(policy_type) => write!(f, "{policy_type} policy type"),
            Self::RootCredentialsManagement => {
                f.write_str("organizations root credentials management")
            }
            Self::RootSessions => f.write_str("organizations root sessions"),
        }
    }
}

/// Terminal outcome of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The remote call changed state.
    Applied {
        /// Calls made.
        attempts: u32,
    },
    /// The remote side reported the state was already in place.
    AlreadyApplied {
        /// Calls made.
        attempts: u32,
    },
    /// No call was made; the cold-start status showed nothing to do.
    Skipped,
    /// The single best-effort call hit a concurrent modification.
    Contended,
}

impl StepOutcome {
    fn remote_calls(self) -> u32 {
        match self {
            Self::Applied { attempts } | Self::AlreadyApplied { attempts } => attempts,
            Self::Contended => 1,
            Self::Skipped => 0,
        }
    }
}

impl From<Convergence> for StepOutcome {
    fn from(value: Convergence) -> Self {
        match value {
            Convergence::Applied { attempts } => Self::Applied { attempts },
            Convergence::AlreadyApplied { attempts } => Self::AlreadyApplied { attempts },
        }
    }
}

/// A step together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// What was toggled.
    pub step: Step,
    /// How it ended.
    pub outcome: StepOutcome,
}

/// Steps completed by one run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    direction: Direction,
    steps: Vec<StepRecord>,
}

impl ActivationReport {
    /// An empty report for a run in `direction`.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            steps: Vec::new(),
        }
    }

    fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    /// Direction of the run.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Completed steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Outcome recorded for `step`, if it ran.
    #[must_use]
    pub fn outcome_of(&self, step: &Step) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|record| &record.step == step)
            .map(|record| record.outcome)
    }

    /// Total remote mutation calls made.
    #[must_use]
    pub fn remote_calls(&self) -> u32 {
        self.steps.iter().map(|r| r.outcome.remote_calls()).sum()
    }

    /// Number of policy-type steps.
    #[must_use]
    pub fn policy_types(&self) -> usize {
        self.steps
            .iter()
            .filter(|r| matches!(r.step, Step::PolicyType(_)))
            .count()
    }

    /// Number of service-access steps.
    #[must_use]
    pub fn service_principals(&self) -> usize {
        self.steps
            .iter()
            .filter(|r| matches!(r.step, Step::ServiceAccess(_)))
            .count()
    }

    /// Attributes exposed to the template through `Fn::GetAtt`.
    #[must_use]
    pub fn to_data(&self) -> BTreeMap<String, serde_json::Value> {
        let state = match self.direction {
            Direction::Enable => "ENABLED",
            Direction::Disable => "DISABLED",
        };
        BTreeMap::from([
            ("State".to_owned(), serde_json::json!(state)),
            ("PolicyTypes".to_owned(), serde_json::json!(self.policy_types())),
            (
                "ServicePrincipals".to_owned(),
                serde_json::json!(self.service_principals()),
            ),
            ("RemoteCalls".to_owned(), serde_json::json!(self.remote_calls())),
        ])
    }
}

/// Runs the enable and disable sequences against the remote clients.
#[derive(Debug, Clone)]
pub struct ActivationSequencer {
    context: Arc<ActivationContext>,
}

impl ActivationSequencer {
    /// Create a sequencer sharing `context`.
    #[must_use]
    pub fn new(context: Arc<ActivationContext>) -> Self {
        Self { context }
    }

    /// Bring every organization feature to the enabled state.
    ///
    /// # Errors
    /// Returns the first remote error that is not already-in-desired-state or
    /// concurrent-modification. Steps already applied stay applied.
    pub async fn create(&self) -> Result<ActivationReport, RemoteError> {
        let mut report = ActivationReport::new(Direction::Enable);

        self.toggle_organizations_access(Direction::Enable, &mut report)
            .await?;
        self.toggle_service_access(Direction::Enable, &mut report)
            .await?;
        self.converge_policy_types(Direction::Enable, &mut report)
            .await?;
        self.toggle_root_access(Direction::Enable, &mut report)
            .await?;

        info!(
            steps = report.steps().len(),
            remote_calls = report.remote_calls(),
            "organization features enabled",
        );
        Ok(report)
    }

    /// Bring every organization feature to the disabled state.
    ///
    /// # Errors
    /// Returns the first remote error that is not already-in-desired-state,
    /// concurrent-modification, or an invalid deactivation.
    pub async fn delete(&self) -> Result<ActivationReport, RemoteError> {
        let mut report = ActivationReport::new(Direction::Disable);

        self.toggle_organizations_access(Direction::Disable, &mut report)
            .await?;
        self.converge_policy_types(Direction::Disable, &mut report)
            .await?;
        self.toggle_root_access(Direction::Disable, &mut report)
            .await?;
        self.toggle_service_access(Direction::Disable, &mut report)
            .await?;

        info!(
            steps = report.steps().len(),
            remote_calls = report.remote_calls(),
            "organization features disabled",
        );
        Ok(report)
    }

    async fn toggle_organizations_access(
        &self,
        direction: Direction,
        report: &mut ActivationReport,
    ) -> Result<(), RemoteError> {
        let step = Step::OrganizationsAccess;
        let status = self.context.status();

        let in_place = match direction {
            Direction::Enable => status.is_enabled(),
            Direction::Disable => status.is_disabled(),
        };
        if in_place {
            warn!(%status, "Organizations access is already {}", status.as_str().to_lowercase());
            report.record(step, StepOutcome::Skipped);
            return Ok(());
        }

        debug!(%status, "{} {step}...", step.progressive(direction));
        let access = &self.context.clients().access;
        let result = match direction {
            Direction::Enable => access.activate_organizations_access().await,
            Direction::Disable => access.deactivate_organizations_access().await,
        };
        let outcome = match result {
            Ok(()) => StepOutcome::Applied { attempts: 1 },
            Err(e)
                if direction == Direction::Disable && e.is(RemoteErrorKind::InvalidOperation) =>
            {
                debug!(error = %e, "organizations access was not active");
                StepOutcome::AlreadyApplied { attempts: 1 }
            }
            Err(e) => return Err(e),
        };

        info!("Successfully {} {step}", step.past(direction).to_lowercase());
        report.record(step, outcome);
        Ok(())
    }

    /// One best-effort call per principal; contention is waited out once and
    /// not retried.
    async fn toggle_service_access(
        &self,
        direction: Direction,
        report: &mut ActivationReport,
    ) -> Result<(), RemoteError> {
        let config = self.context.config();
        let organizations = &self.context.clients().organizations;

        for principal in &config.service_principals {
            let step = Step::ServiceAccess(principal.clone());
            debug!(service_principal = %principal, "{} {step}...", step.progressive(direction));

            let result = match direction {
                Direction::Enable => organizations.enable_aws_service_access(principal).await,
                Direction::Disable => organizations.disable_aws_service_access(principal).await,
            };
            let outcome = match result {
                Ok(()) => StepOutcome::Applied { attempts: 1 },
                Err(e) if e.is(RemoteErrorKind::AlreadyInDesiredState) => {
                    StepOutcome::AlreadyApplied { attempts: 1 }
                }
                Err(e) if e.is(RemoteErrorKind::ConcurrentModification) => {
                    warn!(
                        service_principal = %principal,
                        error = %e,
                        "concurrent modification while changing service access, continuing",
                    );
                    tokio::time::sleep(config.retry_backoff()).await;
                    StepOutcome::Contended
                }
                Err(e) => return Err(e),
            };

            info!(service_principal = %principal, "{} {step}", step.past(direction));
            report.record(step, outcome);
        }
        Ok(())
    }

    /// Every policy type in the catalog converges through
    /// [`retry_until_converged`].
    async fn converge_policy_types(
        &self,
        direction: Direction,
        report: &mut ActivationReport,
    ) -> Result<(), RemoteError> {
        let config = self.context.config();
        let organizations = &self.context.clients().organizations;
        let root = &config.root_id;

        for policy_type in &config.policy_types {
            let step = Step::PolicyType(policy_type.clone());
            debug!(policy_type = %policy_type, "{} {step}...", step.progressive(direction));

            let convergence = retry_until_converged(config.policy_type_retry(), || async move {
                match direction {
                    Direction::Enable => organizations.enable_policy_type(root, policy_type).await,
                    Direction::Disable => {
                        organizations.disable_policy_type(root, policy_type).await
                    }
                }
            })
            .await?;

            if let Convergence::AlreadyApplied { .. } = convergence {
                debug!(policy_type = %policy_type, "policy type was already {direction}d");
            }
            info!(
                policy_type = %policy_type,
                attempts = convergence.attempts(),
                "{} {step}",
                step.past(direction),
            );
            report.record(step, convergence.into());
        }
        Ok(())
    }

    /// Credentials management is enabled before sessions and disabled after them.
    async fn toggle_root_access(
        &self,
        direction: Direction,
        report: &mut ActivationReport,
    ) -> Result<(), RemoteError> {
        let root_access = &self.context.clients().root_access;

        match direction {
            Direction::Enable => {
                apply_once(
                    Step::RootCredentialsManagement,
                    direction,
                    report,
                    root_access.enable_root_credentials_management(),
                )
                .await?;
                apply_once(
                    Step::RootSessions,
                    direction,
                    report,
                    root_access.enable_root_sessions(),
                )
                .await
            }
            Direction::Disable => {
                apply_once(
                    Step::RootSessions,
                    direction,
                    report,
                    root_access.disable_root_sessions(),
                )
                .await?;
                apply_once(
                    Step::RootCredentialsManagement,
                    direction,
                    report,
                    root_access.disable_root_credentials_management(),
                )
                .await
            }
        }
    }
}

/// Run a single call for a root access `step`.
///
/// IAM rejects root access calls with `ServiceAccessNotEnabledException`
/// while it has no trusted access to the organization. Nothing can be
/// enabled then, so when disabling that rejection means the feature is off.
async fn apply_once<F>(
    step: Step,
    direction: Direction,
    report: &mut ActivationReport,
    call: F,
) -> Result<(), RemoteError>
where
    F: Future<Output = Result<(), RemoteError>>,
{
    debug!("{} {step}...", step.progressive(direction));
    let outcome = match call.await {
        Ok(()) => StepOutcome::Applied { attempts: 1 },
        Err(e)
            if direction == Direction::Disable
                && e.is(RemoteErrorKind::ServiceAccessNotEnabled) =>
        {
            warn!(error = %e, "{step} is already disabled, IAM has no trusted access");
            StepOutcome::AlreadyApplied { attempts: 1 }
        }
        Err(e) => return Err(e),
    };
    info!("{} {step}", step.past(direction));
    report.record(step, outcome);
    Ok(())
}
