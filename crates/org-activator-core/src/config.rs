//! Activation configuration.
//!
//! All configuration is driven by environment variables set on the Lambda
//! function. [`ActivationConfig`] covers what the sequencer needs and fails
//! loudly on bad input; [`DispatchSettings`] covers the response plumbing and
//! falls back to defaults so a broken activation config can still be reported
//! to CloudFormation.

use std::collections::HashSet;
use std::hash::Hash;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use org_activator_model::{PolicyType, RootId, ServicePrincipal};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Organizations is a global service homed in `us-east-1`.
pub const DEFAULT_ORGANIZATIONS_REGION: &str = "us-east-1";

/// Endpoint pinned for the Organizations client.
pub const DEFAULT_ORGANIZATIONS_ENDPOINT: &str = "https://organizations.us-east-1.amazonaws.com";

/// Settings for the activation sequencer and its AWS clients.
///
/// # Examples
///
/// ```
/// use org_activator_core::ActivationConfig;
/// use org_activator_model::RootId;
///
/// let config = ActivationConfig::builder()
///     .root_id(RootId::new("r-abc1").unwrap())
///     .build();
/// assert_eq!(config.retry_backoff_ms, 100);
/// assert_eq!(config.service_principals.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ActivationConfig {
    /// Organization root the policy types are toggled on.
    pub root_id: RootId,

    /// Policy types to enable on create and disable on delete.
    #[builder(default = PolicyType::default_catalog())]
    pub policy_types: Vec<PolicyType>,

    /// Service principals granted trusted access.
    #[builder(default = ServicePrincipal::default_list())]
    pub service_principals: Vec<ServicePrincipal>,

    /// Wait after a concurrent-modification rejection, in milliseconds.
    #[builder(default = 100)]
    pub retry_backoff_ms: u64,

    /// Attempt limit for policy-type loops; `None` retries until the
    /// organization stops reporting contention.
    #[builder(default, setter(strip_option))]
    pub policy_type_max_attempts: Option<NonZeroU32>,

    /// Region the Organizations client signs for.
    #[builder(default = String::from(DEFAULT_ORGANIZATIONS_REGION))]
    pub organizations_region: String,

    /// Endpoint override for the Organizations client; `None` uses SDK resolution.
    #[builder(default = Some(String::from(DEFAULT_ORGANIZATIONS_ENDPOINT)))]
    pub organizations_endpoint_url: Option<String>,

    /// Attempts made by the SDK's standard retry strategy per call.
    #[builder(default = 10)]
    pub sdk_max_attempts: u32,
}

impl ActivationConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns an error if `ROOT_ID` is missing or any variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `ROOT_ID` | *(required)* |
    /// | `POLICY_TYPES` | full default catalog |
    /// | `SERVICE_PRINCIPALS` | `iam.amazonaws.com,securityhub.amazonaws.com` |
    /// | `RETRY_BACKOFF_MS` | `100` |
    /// | `POLICY_TYPE_MAX_ATTEMPTS` | *(unbounded)* |
    /// | `ORGANIZATIONS_REGION` | `us-east-1` |
    /// | `ORGANIZATIONS_ENDPOINT_URL` | `https://organizations.us-east-1.amazonaws.com`, empty = SDK default |
    /// | `AWS_SDK_MAX_ATTEMPTS` | `10` |
    ///
    /// # Errors
    /// Returns an error if `ROOT_ID` is missing or any variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root_id = lookup("ROOT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("ROOT_ID"))?;
        let root_id = RootId::new(root_id.trim()).map_err(|source| ConfigError::Model {
            key: "ROOT_ID",
            source,
        })?;

        let mut config = Self::builder().root_id(root_id).build();

        if let Some(v) = lookup("POLICY_TYPES") {
            config.policy_types = parse_list("POLICY_TYPES", &v)?;
        }
        if let Some(v) = lookup("SERVICE_PRINCIPALS") {
            config.service_principals = parse_list("SERVICE_PRINCIPALS", &v)?;
        }
        if let Some(v) = lookup("RETRY_BACKOFF_MS") {
            config.retry_backoff_ms = parse_number("RETRY_BACKOFF_MS", &v)?;
        }
        if let Some(v) = lookup("POLICY_TYPE_MAX_ATTEMPTS") {
            config.policy_type_max_attempts = Some(parse_number("POLICY_TYPE_MAX_ATTEMPTS", &v)?);
        }
        if let Some(v) = lookup("ORGANIZATIONS_REGION").filter(|v| !v.trim().is_empty()) {
            config.organizations_region = v.trim().to_owned();
        }
        if let Some(v) = lookup("ORGANIZATIONS_ENDPOINT_URL") {
            let v = v.trim();
            config.organizations_endpoint_url = (!v.is_empty()).then(|| v.to_owned());
        }
        if let Some(v) = lookup("AWS_SDK_MAX_ATTEMPTS") {
            config.sdk_max_attempts = parse_number("AWS_SDK_MAX_ATTEMPTS", &v)?;
        }

        Ok(config)
    }

    /// Backoff applied after a concurrent-modification rejection.
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Retry policy for policy-type enable/disable loops.
    #[must_use]
    pub fn policy_type_retry(&self) -> RetryPolicy {
        RetryPolicy {
            backoff: self.retry_backoff(),
            max_attempts: self.policy_type_max_attempts,
        }
    }
}

/// Settings for answering CloudFormation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSettings {
    /// Delay before answering a Delete, so the last log lines reach
    /// CloudWatch before the stack removes the log group.
    #[builder(default = Duration::from_secs(120))]
    pub sleep_on_delete: Duration,

    /// Time reserved before the invocation deadline for sending the response.
    #[builder(default = Duration::from_secs(5))]
    pub timeout_margin: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DispatchSettings {
    /// Load settings from `SLEEP_ON_DELETE_SECONDS` and `TIMEOUT_MARGIN_MS`.
    ///
    /// Malformed values are logged and replaced by defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(v) = lookup("SLEEP_ON_DELETE_SECONDS") {
            match parse_number::<u64>("SLEEP_ON_DELETE_SECONDS", &v) {
                Ok(secs) => settings.sleep_on_delete = Duration::from_secs(secs),
                Err(e) => tracing::warn!(error = %e, "ignoring SLEEP_ON_DELETE_SECONDS"),
            }
        }
        if let Some(v) = lookup("TIMEOUT_MARGIN_MS") {
            match parse_number::<u64>("TIMEOUT_MARGIN_MS", &v) {
                Ok(ms) => settings.timeout_margin = Duration::from_millis(ms),
                Err(e) => tracing::warn!(error = %e, "ignoring TIMEOUT_MARGIN_MS"),
            }
        }

        settings
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// Parse a comma-separated list, dropping blanks and repeated entries.
fn parse_list<T>(key: &'static str, raw: &str) -> Result<Vec<T>, ConfigError>
where
    T: FromStr<Err = org_activator_model::ModelError> + Clone + Eq + Hash,
{
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let item: T = part
            .parse()
            .map_err(|source| ConfigError::Model { key, source })?;
        if seen.insert(item.clone()) {
            items.push(item);
        }
    }
    Ok(items)
}
