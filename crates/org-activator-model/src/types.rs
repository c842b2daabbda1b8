//! Identifiers used to address the organization and its features.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Policy types enabled on the organization root by default.
pub const DEFAULT_POLICY_TYPES: &[&str] = &[
    "SERVICE_CONTROL_POLICY",
    "RESOURCE_CONTROL_POLICY",
    "DECLARATIVE_POLICY_EC2",
    "AISERVICES_OPT_OUT_POLICY",
    "BACKUP_POLICY",
    "CHATBOT_POLICY",
    "TAG_POLICY",
    "SECURITYHUB_POLICY",
];

/// Service principals granted trusted access by default.
pub const DEFAULT_SERVICE_PRINCIPALS: &[&str] = &["iam.amazonaws.com", "securityhub.amazonaws.com"];

/// Organization root identifier (`r-` followed by 4 to 32 lowercase alphanumerics).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootId(String);

impl RootId {
    /// Create a new root id.
    ///
    /// # Errors
    /// Returns an error if the id does not match `r-[0-9a-z]{4,32}`.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        let valid = id.strip_prefix("r-").is_some_and(|rest| {
            (4..=32).contains(&rest.len())
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        });
        if !valid {
            return Err(ModelError::InvalidRootId(id));
        }
        Ok(Self(id))
    }

    /// Get the root id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RootId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RootId> for String {
    fn from(value: RootId) -> Self {
        value.0
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named category of organization policy, e.g. `TAG_POLICY`.
///
/// Names are kept verbatim; the AWS adapter maps them onto the SDK enum so
/// newly released policy types work without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyType(String);

impl PolicyType {
    /// Create a new policy type name.
    ///
    /// # Errors
    /// Returns an error unless the name is non-empty uppercase ASCII,
    /// digits, and underscores.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ModelError::InvalidPolicyType(name));
        }
        Ok(Self(name))
    }

    /// Get the policy type name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The default catalog, in activation order.
    #[must_use]
    pub fn default_catalog() -> Vec<Self> {
        DEFAULT_POLICY_TYPES
            .iter()
            .map(|name| Self((*name).to_owned()))
            .collect()
    }
}

impl FromStr for PolicyType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for PolicyType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PolicyType> for String {
    fn from(value: PolicyType) -> Self {
        value.0
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service principal of a collaborator service, e.g. `iam.amazonaws.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServicePrincipal(String);

impl ServicePrincipal {
    /// Create a new service principal.
    ///
    /// # Errors
    /// Returns an error if the principal is empty, contains whitespace, or is
    /// not a dotted host name.
    pub fn new(principal: impl Into<String>) -> Result<Self, ModelError> {
        let principal = principal.into();
        let valid = !principal.is_empty()
            && !principal.chars().any(char::is_whitespace)
            && principal.split('.').count() >= 2
            && principal.split('.').all(|label| !label.is_empty());
        if !valid {
            return Err(ModelError::InvalidServicePrincipal(principal));
        }
        Ok(Self(principal))
    }

    /// Get the principal as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The default principal list, in grant order.
    #[must_use]
    pub fn default_list() -> Vec<Self> {
        DEFAULT_SERVICE_PRINCIPALS
            .iter()
            .map(|p| Self((*p).to_owned()))
            .collect()
    }
}

impl FromStr for ServicePrincipal {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for ServicePrincipal {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServicePrincipal> for String {
    fn from(value: ServicePrincipal) -> Self {
        value.0
    }
}

impl fmt::Display for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of CloudFormation StackSets organizations access, as reported by
/// `DescribeOrganizationsAccess`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessStatus {
    /// `ENABLED`
    Enabled,
    /// `DISABLED`
    Disabled,
    /// `DISABLED_PERMANENTLY`
    DisabledPermanently,
    /// Any value this crate does not recognize, kept verbatim.
    Unknown(String),
}

impl AccessStatus {
    /// Whether access is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }

    /// Whether access is inactive.
    ///
    /// `DISABLED_PERMANENTLY` is not treated as disabled: deactivation is still
    /// attempted and the remote service decides.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::DisabledPermanently => "DISABLED_PERMANENTLY",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for AccessStatus {
    fn from(value: &str) -> Self {
        match value {
            "ENABLED" => Self::Enabled,
            "DISABLED" => Self::Disabled,
            "DISABLED_PERMANENTLY" => Self::DisabledPermanently,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
