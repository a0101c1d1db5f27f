#![deny(clippy::all)]

mod core;

pub mod api;

pub use crate::core::commands::{
    job_status, job_submit, workspace_export, workspace_import, workspace_list,
    workspace_migrate, workspace_mkdir, ExportRequest, ImportRequest, ImportSource, ListRequest,
    MigrateRequest, MkdirRequest, StatusRequest, SubmitRequest,
};
pub use crate::core::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::core::config::{Config, EnvironmentRegistry, GlobalOptions};
pub use crate::core::error::WorkspaceError;
pub use crate::core::tooling::outcome::{
    error_outcome, format_status_message, to_json_response, CommandStatus, ExecutionOutcome,
    UserError,
};
pub use crate::core::transport::{HttpTransport, Transport};
pub use crate::core::workspace::{
    migrate, DirectorySink, Export, ExportSink, ImportStatus, MigrationReport, RunStatus,
    RunSummary, WorkspaceClient,
};
