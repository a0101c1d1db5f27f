use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("workspace path must not be empty")]
pub struct InvalidPathError;

/// A slash-rooted location in the remote workspace tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspacePath(String);

impl WorkspacePath {
    /// Normalizes `raw` so it always begins with `/`.
    ///
    /// # Errors
    /// Returns [`InvalidPathError`] for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, InvalidPathError> {
        if raw.trim().is_empty() {
            return Err(InvalidPathError);
        }
        if raw.starts_with('/') {
            Ok(Self(raw.to_string()))
        } else {
            Ok(Self(format!("/{raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment; empty for the workspace root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorkspacePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
