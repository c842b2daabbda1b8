//! Error types shared by the model and every remote collaborator.

use std::fmt;

/// Validation error for model identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Root id does not match `r-[0-9a-z]{4,32}`.
    #[error("invalid organization root id: {0:?} (expected r- followed by 4-32 lowercase alphanumerics)")]
    InvalidRootId(String),

    /// Policy type name is not an uppercase identifier.
    #[error("invalid policy type: {0:?}")]
    InvalidPolicyType(String),

    /// Service principal is not a dotted host name.
    #[error("invalid service principal: {0:?}")]
    InvalidServicePrincipal(String),
}

/// How the sequencer should react to a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The feature is already in the requested state (e.g. policy type
    /// already enabled). Counts as success.
    AlreadyInDesiredState,
    /// Another mutation is in flight against the organization. Transient.
    ConcurrentModification,
    /// The operation is not valid in the current state. Benign only where a
    /// caller says so.
    InvalidOperation,
    /// The calling service has no trusted access to the organization. Benign
    /// when turning that service's features off.
    ServiceAccessNotEnabled,
    /// Anything else. Aborts the sequence.
    Other,
}

impl RemoteErrorKind {
    /// Classify an AWS error code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "PolicyTypeAlreadyEnabledException" | "PolicyTypeNotEnabledException" => {
                Self::AlreadyInDesiredState
            }
            "ConcurrentModificationException" => Self::ConcurrentModification,
            "InvalidOperationException" => Self::InvalidOperation,
            "ServiceAccessNotEnabledException" => Self::ServiceAccessNotEnabled,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyInDesiredState => "already in desired state",
            Self::ConcurrentModification => "concurrent modification",
            Self::InvalidOperation => "invalid operation",
            Self::ServiceAccessNotEnabled => "service access not enabled",
            Self::Other => "remote failure",
        };
        f.write_str(s)
    }
}

/// Failure reported by a remote control-plane call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed ({code}): {message}")]
pub struct RemoteError {
    kind: RemoteErrorKind,
    operation: &'static str,
    code: String,
    message: String,
}

/// Code used when the remote service did not report one.
const UNKNOWN_CODE: &str = "Unknown";

impl RemoteError {
    /// Build an error from a service error code, classifying it.
    #[must_use]
    pub fn new(operation: &'static str, code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            kind: RemoteErrorKind::from_code(&code),
            operation,
            code,
            message: message.into(),
        }
    }

    /// Build an error with no service error code (transport, timeout,
    /// credential resolution). Always [`RemoteErrorKind::Other`].
    #[must_use]
    pub fn unclassified(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Other,
            operation,
            code: UNKNOWN_CODE.to_owned(),
            message: message.into(),
        }
    }

    /// Classification of this error.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    /// Remote operation name, e.g. `EnablePolicyType`.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Service error code, or `Unknown`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Service error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `self.kind() == kind`.
    #[must_use]
    pub fn is(&self, kind: RemoteErrorKind) -> bool {
        self.kind == kind
    }
}
