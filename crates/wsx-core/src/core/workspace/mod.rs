//! Workspace client: listing, transfer, migration, and job runs against one
//! environment's REST endpoint.

use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use wsx_domain::{Environment, WorkspacePath};

use crate::core::error::{ensure_success, WorkspaceError};
use crate::core::transport::{HttpTransport, Transport};

mod jobs;
mod migration;
mod sink;
mod transfer;
mod traversal;

pub use jobs::{RunStatus, RunSummary};
pub use migration::{migrate, MigrationReport};
pub use sink::{DirectorySink, ExportSink};
pub use transfer::{Export, ImportStatus};

pub(crate) const DEFAULT_RUN_PREFIX: &str = "adhoc_run_";

const MKDIRS_ACTION: &str = "workspace/mkdirs";

pub struct WorkspaceClient<T = HttpTransport> {
    environment: Environment,
    transport: T,
    run_prefix: String,
}

impl WorkspaceClient<HttpTransport> {
    /// Connects to the instance described by `environment` over HTTPS.
    ///
    /// # Errors
    /// Returns an error if the HTTP transport cannot be built.
    pub fn connect(environment: Environment, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::for_environment(&environment, timeout)?;
        Ok(Self::new(environment, transport))
    }
}

impl<T: Transport> WorkspaceClient<T> {
    pub fn new(environment: Environment, transport: T) -> Self {
        Self {
            environment,
            transport,
            run_prefix: DEFAULT_RUN_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_run_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.run_prefix = prefix.into();
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Creates `path` and any missing parents; existing directories are left alone.
    ///
    /// # Errors
    /// Returns an error for an empty path, a transport failure, or an error
    /// code in the response body.
    pub fn make_directory(&self, path: &str) -> Result<WorkspacePath> {
        let path = WorkspacePath::parse(path).map_err(WorkspaceError::from)?;
        let response = self
            .transport
            .post(MKDIRS_ACTION, &json!({ "path": path.as_str() }))?;
        ensure_success(MKDIRS_ACTION, &response)?;
        info!("path {path} created");
        Ok(path)
    }
}
