use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::config::context::CommandInfo;
use crate::core::error::WorkspaceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }
}

/// A failure the caller can fix: bad input, missing credentials, rejected request.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct UserError {
    pub(crate) message: String,
    pub(crate) details: Value,
}

impl UserError {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &Value {
        &self.details
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

/// Maps an error escaping a command handler onto an outcome envelope.
pub fn error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    if let Some(user) = err.downcast_ref::<UserError>() {
        return ExecutionOutcome::user_error(user.message().to_string(), user.details().clone());
    }
    if let Some(workspace) = err.downcast_ref::<WorkspaceError>() {
        if let Some(outcome) = workspace_error_outcome(workspace) {
            return outcome;
        }
    }
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "internal_error",
            "error": err.to_string(),
            "issues": issues,
        }),
    )
}

fn workspace_error_outcome(err: &WorkspaceError) -> Option<ExecutionOutcome> {
    let outcome = match err {
        WorkspaceError::InvalidPath(_) => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "invalid_path",
                "hint": "Pass a non-empty workspace path such as /Users/me/notebook.",
            }),
        ),
        WorkspaceError::Remote {
            action,
            code,
            message,
        } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "remote_error",
                "action": action,
                "error_code": code,
                "error": message,
            }),
        ),
        WorkspaceError::MissingClusterId { environment } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "missing_cluster_id",
                "environment": environment.label(),
                "hint": format!(
                    "Set WSX_{}_CLUSTER_ID or cluster_id under [{}] in the config file.",
                    environment.label().to_ascii_uppercase(),
                    environment.label(),
                ),
            }),
        ),
        WorkspaceError::EnvironmentMismatch { from, to } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": "environment_mismatch",
                "from": from.label(),
                "to": to.label(),
            }),
        ),
        WorkspaceError::MissingField { .. } | WorkspaceError::UnsafeFileType { .. } => {
            return None
        }
    };
    Some(outcome)
}

pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let prefix = format!("wsx {}", info.name);
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}
