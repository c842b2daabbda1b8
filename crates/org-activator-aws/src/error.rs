//! Mapping SDK errors onto [`RemoteError`].

use aws_sdk_organizations::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use org_activator_model::RemoteError;

/// Classify an SDK error by its service error code.
///
/// Errors without a code (dispatch failures, timeouts, credential problems)
/// keep the full error chain as their message.
pub(crate) fn remote_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(ToOwned::to_owned);
    let message = err.message().map(ToOwned::to_owned);
    let error = classify(operation, code.as_deref(), message.as_deref(), || {
        DisplayErrorContext(err).to_string()
    });
    tracing::debug!(operation, code = error.code(), kind = %error.kind(), "remote call failed");
    error
}

pub(crate) fn classify(
    operation: &'static str,
    code: Option<&str>,
    message: Option<&str>,
    context: impl FnOnce() -> String,
) -> RemoteError {
    match code {
        Some(code) => RemoteError::new(
            operation,
            code,
            message.map_or_else(context, ToOwned::to_owned),
        ),
        None => RemoteError::unclassified(operation, context()),
    }
}
