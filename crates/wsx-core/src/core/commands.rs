//! Command handlers: run one client operation and shape the outcome envelope.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use wsx_domain::{ExportFormat, RunParameters, WorkspacePath};

use crate::core::config::context::CommandContext;
use crate::core::error::WorkspaceError;
use crate::core::tooling::outcome::{ExecutionOutcome, UserError};
use crate::core::transport::Transport;
use crate::core::workspace::{migrate, ExportSink, ImportStatus, WorkspaceClient};

const ALREADY_EXISTS: &str = "RESOURCE_ALREADY_EXISTS";

#[derive(Clone, Debug)]
pub struct ListRequest {
    pub path: String,
}

#[derive(Clone, Debug)]
pub struct MkdirRequest {
    pub path: String,
}

#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub path: String,
    pub format: ExportFormat,
    pub save: bool,
    pub out_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub enum ImportSource {
    File(PathBuf),
    Content(String),
}

#[derive(Clone, Debug)]
pub struct ImportRequest {
    pub path: String,
    pub source: ImportSource,
    pub format: ExportFormat,
    pub overwrite: bool,
}

#[derive(Clone, Debug)]
pub struct MigrateRequest {
    pub path: String,
}

#[derive(Clone, Debug)]
pub struct SubmitRequest {
    pub path: String,
    pub parameters: Option<RunParameters>,
    pub run_name: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct StatusRequest {
    pub run_id: u64,
}

/// Lists every leaf under a workspace path.
///
/// # Errors
/// Returns an error when the client cannot be built or the listing fails.
pub fn workspace_list(ctx: &CommandContext, request: &ListRequest) -> Result<ExecutionOutcome> {
    list_outcome(&ctx.active_client()?, request)
}

/// # Errors
/// Returns an error when the client cannot be built or the request fails.
pub fn workspace_mkdir(ctx: &CommandContext, request: &MkdirRequest) -> Result<ExecutionOutcome> {
    mkdir_outcome(&ctx.active_client()?, request)
}

/// # Errors
/// Returns an error when the client cannot be built or the export fails.
pub fn workspace_export(ctx: &CommandContext, request: &ExportRequest) -> Result<ExecutionOutcome> {
    let client = ctx.active_client()?;
    let sink = request
        .save
        .then(|| ctx.export_sink(request.out_dir.as_deref()));
    export_outcome(&client, request, sink.as_ref().map(|s| s as &dyn ExportSink))
}

/// # Errors
/// Returns an error when the content cannot be read, the client cannot be
/// built, or the request fails in transport.
pub fn workspace_import(ctx: &CommandContext, request: &ImportRequest) -> Result<ExecutionOutcome> {
    let content = import_content(&request.source)?;
    import_outcome(&ctx.active_client()?, request, &content)
}

/// Copies a path from the selected environment into its counterpart.
///
/// # Errors
/// Returns an error when either client cannot be built or a request fails.
pub fn workspace_migrate(
    ctx: &CommandContext,
    request: &MigrateRequest,
) -> Result<ExecutionOutcome> {
    let source = ctx.active_client()?;
    let target = ctx.counterpart_client()?;
    migrate_outcome(&source, &target, request)
}

/// # Errors
/// Returns an error when the client cannot be built or the submission fails.
pub fn job_submit(ctx: &CommandContext, request: &SubmitRequest) -> Result<ExecutionOutcome> {
    submit_outcome(&ctx.active_client()?, request)
}

/// # Errors
/// Returns an error when the client cannot be built or either lookup fails.
pub fn job_status(ctx: &CommandContext, request: &StatusRequest) -> Result<ExecutionOutcome> {
    status_outcome(&ctx.active_client()?, *request)
}

fn parse_path(raw: &str) -> Result<WorkspacePath> {
    Ok(WorkspacePath::parse(raw).map_err(WorkspaceError::from)?)
}

fn list_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: &ListRequest,
) -> Result<ExecutionOutcome> {
    let path = parse_path(&request.path)?;
    let items = client.list(path.as_str())?;
    Ok(ExecutionOutcome::success(
        format!("{} items under {path}", items.len()),
        json!({
            "environment": client.environment().kind().label(),
            "path": path,
            "items": items,
        }),
    ))
}

fn mkdir_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: &MkdirRequest,
) -> Result<ExecutionOutcome> {
    let path = client.make_directory(&request.path)?;
    Ok(ExecutionOutcome::success(
        format!("path {path} created"),
        json!({
            "environment": client.environment().kind().label(),
            "path": path,
        }),
    ))
}

fn export_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: &ExportRequest,
    sink: Option<&dyn ExportSink>,
) -> Result<ExecutionOutcome> {
    let export = client.export(&request.path, request.format, sink)?;
    let message = match (&export.saved_to, request.save) {
        (Some(dest), _) => format!("exported {} to {}", export.path, dest.display()),
        (None, true) => format!("exported {} but could not save it locally", export.path),
        (None, false) => format!("exported {} ({})", export.path, export.format),
    };
    let mut details = json!({
        "environment": client.environment().kind().label(),
        "path": export.path,
        "format": export.format,
        "file_type": export.file_type,
        "saved_to": export.saved_to.as_ref().map(|p| p.display().to_string()),
        "content": export.content,
    });
    if request.save && export.saved_to.is_none() {
        details["hint"] = json!("Check that the export directory is writable (WSX_EXPORT_DIR or --out).");
    }
    Ok(ExecutionOutcome::success(message, details))
}

fn import_content(source: &ImportSource) -> Result<String> {
    match source {
        ImportSource::File(path) => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(STANDARD.encode(bytes))
        }
        ImportSource::Content(content) => {
            let trimmed = content.trim();
            if STANDARD.decode(trimmed).is_err() {
                return Err(UserError::new(
                    "import content is not valid base64",
                    json!({
                        "reason": "invalid_content",
                        "hint": "Pass --file to upload raw bytes, or base64-encode the content first.",
                    }),
                )
                .into());
            }
            Ok(trimmed.to_string())
        }
    }
}

fn import_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: &ImportRequest,
    content: &str,
) -> Result<ExecutionOutcome> {
    let path = parse_path(&request.path)?;
    let status = client.import(path.as_str(), content, request.format, request.overwrite)?;
    let environment = client.environment().kind().label();
    Ok(match status {
        ImportStatus::Imported => ExecutionOutcome::success(
            format!("{path} imported"),
            json!({
                "environment": environment,
                "path": path,
                "format": request.format,
                "overwrite": request.overwrite,
            }),
        ),
        ImportStatus::Rejected {
            error_code,
            message,
        } => {
            let mut details = json!({
                "reason": "import_rejected",
                "environment": environment,
                "path": path,
                "error_code": error_code,
                "error": message,
            });
            if error_code == ALREADY_EXISTS && !request.overwrite {
                details["hint"] = json!("Pass --overwrite to replace the existing object.");
            }
            ExecutionOutcome::user_error(format!("import of {path} rejected: {error_code}"), details)
        }
    })
}

fn migrate_outcome<S: Transport, D: Transport>(
    source: &WorkspaceClient<S>,
    target: &WorkspaceClient<D>,
    request: &MigrateRequest,
) -> Result<ExecutionOutcome> {
    let report = migrate(source, target, &request.path)?;
    let details = json!({
        "path": report.path,
        "from": report.from.label(),
        "to": report.to.label(),
        "import": report.import,
    });
    Ok(match &report.import {
        ImportStatus::Imported => ExecutionOutcome::success(
            format!("{} migrated from {} to {}", report.path, report.from, report.to),
            details,
        ),
        ImportStatus::Rejected { error_code, .. } => {
            let mut details = details;
            details["reason"] = json!("migration_rejected");
            if error_code == ALREADY_EXISTS {
                details["hint"] = json!(format!(
                    "{} already exists in {}; migration never overwrites.",
                    report.path, report.to
                ));
            }
            ExecutionOutcome::user_error(
                format!("{} was not migrated to {}: {error_code}", report.path, report.to),
                details,
            )
        }
    })
}

fn submit_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: &SubmitRequest,
) -> Result<ExecutionOutcome> {
    let path = parse_path(&request.path)?;
    let run_id = client.submit(
        path.as_str(),
        request.parameters.clone(),
        request.run_name.as_deref(),
    )?;
    Ok(ExecutionOutcome::success(
        format!("running {} (run_id {run_id})", path.name()),
        json!({
            "environment": client.environment().kind().label(),
            "path": path,
            "run_id": run_id,
        }),
    ))
}

fn status_outcome<T: Transport>(
    client: &WorkspaceClient<T>,
    request: StatusRequest,
) -> Result<ExecutionOutcome> {
    let status = client.status(request.run_id)?;
    let summaries = status.summaries();
    Ok(ExecutionOutcome::success(
        format!(
            "run {} belongs to job {} ({} runs)",
            status.run_id,
            status.job_id,
            summaries.len()
        ),
        json!({
            "environment": client.environment().kind().label(),
            "run_id": status.run_id,
            "job_id": status.job_id,
            "summaries": summaries,
            "runs": status.runs,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{client, FakeWorkspace};
    use crate::core::tooling::outcome::CommandStatus;
    use crate::core::workspace::DirectorySink;
    use tempfile::tempdir;
    use wsx_domain::EnvironmentKind;

    #[test]
    fn list_outcome_reports_items() -> Result<()> {
        let fake = FakeWorkspace::new()
            .with_file("/p/a", "", "py")
            .with_file("/p/d/b", "", "py");
        let outcome = list_outcome(
            &client(EnvironmentKind::NonProduction, &fake),
            &ListRequest { path: "p".into() },
        )?;
        assert_eq!(outcome.status, CommandStatus::Ok);
        assert_eq!(outcome.message, "2 items under /p");
        assert_eq!(outcome.details["items"], json!(["/p/a", "/p/d/b"]));
        assert_eq!(outcome.details["environment"], "dev");
        Ok(())
    }

    #[test]
    fn export_outcome_includes_saved_location() -> Result<()> {
        let tmp = tempdir()?;
        let sink = DirectorySink::new(tmp.path());
        let fake = FakeWorkspace::new().with_file("/nb", &STANDARD.encode("x = 1"), "py");
        let request = ExportRequest {
            path: "/nb".into(),
            format: ExportFormat::Source,
            save: true,
            out_dir: None,
        };
        let outcome = export_outcome(
            &client(EnvironmentKind::NonProduction, &fake),
            &request,
            Some(&sink),
        )?;
        let saved = tmp.path().join("nb.py");
        assert_eq!(
            outcome.details["saved_to"],
            json!(saved.display().to_string())
        );
        assert_eq!(fs::read_to_string(saved)?, "x = 1");
        Ok(())
    }

    #[test]
    fn import_from_file_encodes_bytes() -> Result<()> {
        let tmp = tempdir()?;
        let file = tmp.path().join("job.py");
        fs::write(&file, b"print('ok')")?;
        let content = import_content(&ImportSource::File(file))?;
        assert_eq!(content, STANDARD.encode("print('ok')"));
        Ok(())
    }

    #[test]
    fn invalid_inline_content_is_a_user_error() {
        let err = import_content(&ImportSource::Content("not base64 !".into()))
            .expect_err("invalid");
        let user = err.downcast_ref::<UserError>().expect("user error");
        assert_eq!(user.details()["reason"], "invalid_content");
    }

    #[test]
    fn rejected_import_suggests_overwrite() -> Result<()> {
        let fake = FakeWorkspace::new().with_file("/nb", "b2xk", "dbc");
        let request = ImportRequest {
            path: "/nb".into(),
            source: ImportSource::Content("bmV3".into()),
            format: ExportFormat::Dbc,
            overwrite: false,
        };
        let outcome = import_outcome(
            &client(EnvironmentKind::NonProduction, &fake),
            &request,
            "bmV3",
        )?;
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["error_code"], ALREADY_EXISTS);
        assert!(outcome.details["hint"]
            .as_str()
            .is_some_and(|hint| hint.contains("--overwrite")));
        Ok(())
    }

    #[test]
    fn migrate_outcome_names_both_sides() -> Result<()> {
        let prod = FakeWorkspace::new().with_file("/nb", "eA==", "dbc");
        let dev = FakeWorkspace::new();
        let outcome = migrate_outcome(
            &client(EnvironmentKind::Production, &prod),
            &client(EnvironmentKind::NonProduction, &dev),
            &MigrateRequest { path: "nb".into() },
        )?;
        assert_eq!(outcome.status, CommandStatus::Ok);
        assert_eq!(outcome.message, "/nb migrated from prod to dev");
        assert_eq!(outcome.details["import"]["status"], "imported");
        Ok(())
    }

    #[test]
    fn submit_and_status_round_through_outcomes() -> Result<()> {
        let fake = FakeWorkspace::new();
        let client = client(EnvironmentKind::NonProduction, &fake);
        let submitted = submit_outcome(
            &client,
            &SubmitRequest {
                path: "etl/load".into(),
                parameters: None,
                run_name: None,
            },
        )?;
        let run_id = submitted.details["run_id"].as_u64().expect("run id");
        let status = status_outcome(&client, StatusRequest { run_id })?;
        assert_eq!(status.details["job_id"], json!(1000 + run_id));
        assert_eq!(status.details["summaries"][0]["run_name"], "adhoc_run_load");
        Ok(())
    }
}
