use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use wsx_domain::{ExportFormat, WorkspacePath};

use super::sink::ExportSink;
use super::WorkspaceClient;
use crate::core::error::{ensure_success, WorkspaceError};
use crate::core::transport::Transport;

const EXPORT_ACTION: &str = "workspace/export";
const IMPORT_ACTION: &str = "workspace/import";

#[derive(Debug, Clone, Serialize)]
pub struct Export {
    pub path: WorkspacePath,
    pub format: ExportFormat,
    /// Base64 payload exactly as returned by the remote side.
    pub content: String,
    pub file_type: Option<String>,
    /// Set when the export was handed to a sink and the write succeeded.
    pub saved_to: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ImportStatus {
    Imported,
    Rejected {
        error_code: String,
        message: Option<String>,
    },
}

impl ImportStatus {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportStatus::Imported)
    }
}

impl<T: Transport> WorkspaceClient<T> {
    /// Downloads the object at `path` as base64 content.
    ///
    /// Directories must be exported as [`ExportFormat::Dbc`]; the remote side
    /// enforces that. When `sink` is given, the decoded bytes are also saved as
    /// `<name>.<file_type>`; a failed save is logged and leaves
    /// [`Export::saved_to`] empty instead of failing the export.
    ///
    /// # Errors
    /// Returns an error for an empty path, a transport failure, an error code
    /// in the response, or a response without `content`.
    pub fn export(
        &self,
        path: &str,
        format: ExportFormat,
        sink: Option<&dyn ExportSink>,
    ) -> Result<Export> {
        let path = WorkspacePath::parse(path).map_err(WorkspaceError::from)?;
        let response = self.transport.get(
            EXPORT_ACTION,
            &json!({ "path": path.as_str(), "format": format.as_str() }),
        )?;
        ensure_success(EXPORT_ACTION, &response)?;
        let content = response
            .get("content")
            .and_then(Value::as_str)
            .ok_or(WorkspaceError::MissingField {
                action: EXPORT_ACTION,
                field: "content",
            })?
            .to_string();
        let file_type = response
            .get("file_type")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        let saved_to = sink.and_then(|sink| {
            match save_export(sink, &path, format, file_type.as_deref(), &content) {
                Ok(dest) => {
                    info!("{path} saved to {}", dest.display());
                    Some(dest)
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(path = %path, error = %error, "failed to save export locally");
                    None
                }
            }
        });

        Ok(Export {
            path,
            format,
            content,
            file_type,
            saved_to,
        })
    }

    /// Uploads base64 `content` to `path`.
    ///
    /// A rejection by the remote side (for example an existing object with
    /// `overwrite` off) is returned as [`ImportStatus::Rejected`], not raised.
    ///
    /// # Errors
    /// Returns an error for an empty path or a transport failure.
    pub fn import(
        &self,
        path: &str,
        content: &str,
        format: ExportFormat,
        overwrite: bool,
    ) -> Result<ImportStatus> {
        let path = WorkspacePath::parse(path).map_err(WorkspaceError::from)?;
        let status = self.send_import(&path, content, format, overwrite)?;
        if status.is_imported() {
            info!("{path} imported");
        }
        Ok(status)
    }

    pub(crate) fn send_import(
        &self,
        path: &WorkspacePath,
        content: &str,
        format: ExportFormat,
        overwrite: bool,
    ) -> Result<ImportStatus> {
        let body = json!({
            "path": path.as_str(),
            "format": format.as_str(),
            "content": content,
            "overwrite": overwrite,
        });
        let response = self.transport.post(IMPORT_ACTION, &body)?;
        let Some(code) = response.get("error_code").and_then(Value::as_str) else {
            return Ok(ImportStatus::Imported);
        };
        let message = response
            .get("message")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        warn!(
            path = %path,
            environment = %self.environment.kind(),
            error_code = code,
            "import rejected"
        );
        Ok(ImportStatus::Rejected {
            error_code: code.to_string(),
            message,
        })
    }
}

fn save_export(
    sink: &dyn ExportSink,
    path: &WorkspacePath,
    format: ExportFormat,
    file_type: Option<&str>,
    content: &str,
) -> Result<PathBuf> {
    let extension = match file_type {
        Some(file_type) => file_type.to_string(),
        None => format.as_str().to_ascii_lowercase(),
    };
    if extension.is_empty() || extension.contains(['/', '\\']) || extension.contains("..") {
        return Err(WorkspaceError::UnsafeFileType {
            file_type: extension,
        }
        .into());
    }
    let stem = match path.name() {
        "" => "workspace",
        name => name,
    };
    let bytes = STANDARD
        .decode(content)
        .with_context(|| format!("export of {path} is not valid base64"))?;
    sink.save(&format!("{stem}.{extension}"), &bytes)
}
