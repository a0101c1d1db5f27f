use std::collections::VecDeque;

use anyhow::Result;
use serde_json::{json, Value};
use tracing::{debug, trace};
use wsx_domain::{NamespaceEntry, ObjectType, WorkspacePath};

use super::WorkspaceClient;
use crate::core::error::{ensure_success, WorkspaceError};
use crate::core::transport::Transport;

const LIST_ACTION: &str = "workspace/list";

impl<T: Transport> WorkspaceClient<T> {
    /// Returns every non-directory path under `root`, in discovery order.
    ///
    /// Directories are expanded through a FIFO queue, so leaves of a directory
    /// listed earlier always precede leaves found in directories queued later.
    ///
    /// # Errors
    /// Returns an error for an empty root, a transport failure, or a listing
    /// rejected by the remote side.
    pub fn list(&self, root: &str) -> Result<Vec<String>> {
        let root = WorkspacePath::parse(root).map_err(WorkspaceError::from)?;
        let mut pending = VecDeque::from([root.as_str().to_string()]);
        let mut leaves = Vec::new();
        while let Some(directory) = pending.pop_front() {
            for entry in self.list_directory(&directory)? {
                if entry.object_type.is_directory() {
                    pending.push_back(entry.path);
                } else {
                    leaves.push(entry.path);
                }
            }
        }
        debug!(root = %root, leaves = leaves.len(), "workspace listing complete");
        Ok(leaves)
    }

    /// Lists the immediate children of a single directory.
    ///
    /// # Errors
    /// Returns an error for a transport failure or an error code in the body.
    pub fn list_directory(&self, path: &str) -> Result<Vec<NamespaceEntry>> {
        trace!(path, "listing directory");
        let response = self.transport.get(LIST_ACTION, &json!({ "path": path }))?;
        Ok(parse_listing(&response)?)
    }
}

/// An empty directory comes back without `objects`; that is not an error.
fn parse_listing(response: &Value) -> Result<Vec<NamespaceEntry>, WorkspaceError> {
    ensure_success(LIST_ACTION, response)?;
    let Some(objects) = response.get("objects").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    objects
        .iter()
        .map(|object| {
            let path = object
                .get("path")
                .and_then(Value::as_str)
                .ok_or(WorkspaceError::MissingField {
                    action: LIST_ACTION,
                    field: "path",
                })?;
            let object_type = object
                .get("object_type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Ok(NamespaceEntry {
                path: path.to_string(),
                object_type: ObjectType::from_remote(object_type),
            })
        })
        .collect()
}
