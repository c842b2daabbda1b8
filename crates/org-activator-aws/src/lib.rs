//! AWS SDK implementations of the activation collaborator traits.
//!
//! | Trait | Service | Client |
//! |-------|---------|--------|
//! | [`OrganizationsAccessApi`](org_activator_core::OrganizationsAccessApi) | CloudFormation | [`CloudFormationAccess`] |
//! | [`OrganizationsApi`](org_activator_core::OrganizationsApi) | Organizations | [`OrganizationsClient`] |
//! | [`RootAccessApi`](org_activator_core::RootAccessApi) | IAM | [`IamRootAccess`] |
//!
//! [`build_clients`] wires all three from one shared SDK configuration.

mod client;
mod cloudformation;
mod error;
mod iam;
mod organizations;

pub use client::{build_clients, load_sdk_config, organizations_config};
pub use cloudformation::CloudFormationAccess;
pub use iam::IamRootAccess;
pub use organizations::OrganizationsClient;
