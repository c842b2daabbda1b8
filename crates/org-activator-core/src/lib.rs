//! Organization activation: turning organization-wide features on and off.
//!
//! # Architecture
//!
//! ```text
//! LifecycleDispatcher (Create / Update / Delete -> CfnResponse)
//!        |
//!        v
//! ActivationSequencer (ordered, idempotent enable/disable steps)
//!        |
//!        v
//! retry_until_converged (contention backoff, already-done short-circuit)
//!        |
//!        v
//! ActivationClients (OrganizationsAccessApi, OrganizationsApi, RootAccessApi)
//! ```
//!
//! The remote services sit behind the traits in [`api`]; the AWS SDK backed
//! implementations live in a separate crate so the sequencing logic can be
//! exercised against the in-memory control plane in [`mock`].

pub mod api;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod sequencer;

pub use api::{ActivationClients, OrganizationsAccessApi, OrganizationsApi, RootAccessApi};
pub use config::{ActivationConfig, DispatchSettings};
pub use context::ActivationContext;
pub use dispatcher::{InvocationMeta, LifecycleDispatcher};
pub use error::{ActivationError, ConfigError};
pub use retry::{Convergence, RetryPolicy, retry_until_converged};
pub use sequencer::{ActivationReport, ActivationSequencer, Direction, Step, StepOutcome};
