//! CloudFormation custom resource request and response documents.
//!
//! CloudFormation invokes the function with a [`CfnRequest`] and expects a
//! [`CfnResponse`] to be `PUT` to the pre-signed `ResponseURL`. Field names
//! follow the wire format (`PascalCase`, with `ResponseURL` spelled out).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle event carried by a custom resource request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Resource is being created.
    Create,
    /// Resource properties changed.
    Update,
    /// Resource is being deleted.
    Delete,
}

impl RequestType {
    /// Wire name of the request type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom resource request sent by CloudFormation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRequest {
    /// Lifecycle event.
    pub request_type: RequestType,
    /// Pre-signed S3 URL the response must be uploaded to.
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    /// ARN of the stack that owns the resource.
    pub stack_id: String,
    /// Unique id of this request.
    pub request_id: String,
    /// Template type of the resource, e.g. `Custom::OrganizationActivation`.
    #[serde(default)]
    pub resource_type: String,
    /// Logical id of the resource in the template.
    pub logical_resource_id: String,
    /// Physical id assigned on create; absent on Create requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// ARN of the function (or topic) CloudFormation invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    /// Resource properties from the template.
    #[serde(default)]
    pub resource_properties: serde_json::Value,
    /// Previous properties; present on Update requests only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<serde_json::Value>,
}

/// Outcome reported back to CloudFormation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// The lifecycle operation succeeded.
    Success,
    /// The lifecycle operation failed; `Reason` explains why.
    Failed,
}

/// Custom resource response uploaded to the request's `ResponseURL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResponse {
    /// Overall outcome.
    pub status: ResponseStatus,
    /// Human-readable explanation, required by CloudFormation when failed.
    pub reason: String,
    /// Physical id of the resource.
    pub physical_resource_id: String,
    /// Copied from the request.
    pub stack_id: String,
    /// Copied from the request.
    pub request_id: String,
    /// Copied from the request.
    pub logical_resource_id: String,
    /// Whether `Data` must be masked in console output.
    pub no_echo: bool,
    /// Output attributes readable with `Fn::GetAtt`.
    pub data: BTreeMap<String, serde_json::Value>,
}

impl CfnResponse {
    /// Start a response that echoes the identifying fields of `request`.
    #[must_use]
    pub fn for_request(
        request: &CfnRequest,
        status: ResponseStatus,
        physical_resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            physical_resource_id: physical_resource_id.into(),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data: BTreeMap::new(),
        }
    }

    /// Whether this response reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
