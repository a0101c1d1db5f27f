use serde_json::Value;
use wsx_domain::{EnvironmentKind, InvalidPathError};

/// Errors raised by the workspace client itself.
///
/// Transport faults are not represented here; they travel as `anyhow` errors
/// with request context attached.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),
    #[error("{action} response is missing '{field}'")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
    #[error("{action} was rejected with {code}: {message}")]
    Remote {
        action: &'static str,
        code: String,
        message: String,
    },
    #[error("no execution cluster configured for the {environment} environment")]
    MissingClusterId { environment: EnvironmentKind },
    #[error("cannot migrate from {from} to {to}; the target must be the counterpart environment")]
    EnvironmentMismatch {
        from: EnvironmentKind,
        to: EnvironmentKind,
    },
    #[error("remote file type '{file_type}' cannot be used as a file extension")]
    UnsafeFileType { file_type: String },
}

/// Extracts the `{error_code, message}` pair the REST API returns on failure.
pub(crate) fn remote_error(action: &'static str, response: &Value) -> Option<WorkspaceError> {
    let code = response.get("error_code").and_then(Value::as_str)?;
    let message = response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(WorkspaceError::Remote {
        action,
        code: code.to_string(),
        message: message.to_string(),
    })
}

/// Fails with [`WorkspaceError::Remote`] when the body carries an error code.
pub(crate) fn ensure_success(action: &'static str, response: &Value) -> Result<(), WorkspaceError> {
    match remote_error(action, response) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
