//! Shared model types for the organization activation custom resource.
//!
//! This crate holds the plain data that flows between the sequencer, the AWS
//! adapters, and the Lambda entry point:
//!
//! - [`types`]: validated identifiers (policy types, service principals, the
//!   organization root) and the cold-start [`AccessStatus`](types::AccessStatus).
//! - [`error`]: the [`RemoteError`](error::RemoteError) taxonomy every remote
//!   collaborator reports through.
//! - [`cfn`]: CloudFormation custom resource request and response documents.

pub mod cfn;
pub mod error;
pub mod types;

pub use cfn::{CfnRequest, CfnResponse, RequestType, ResponseStatus};
pub use error::{ModelError, RemoteError, RemoteErrorKind};
pub use types::{AccessStatus, PolicyType, RootId, ServicePrincipal};
