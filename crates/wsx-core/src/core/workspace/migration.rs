use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};
use wsx_domain::{EnvironmentKind, ExportFormat, WorkspacePath};

use super::transfer::ImportStatus;
use super::WorkspaceClient;
use crate::core::error::WorkspaceError;
use crate::core::transport::Transport;

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub path: WorkspacePath,
    pub from: EnvironmentKind,
    pub to: EnvironmentKind,
    pub import: ImportStatus,
}

/// Copies the object at `path` from `source` into `target` at the same path.
///
/// The content travels in memory as DBC and is never written over an
/// existing destination object. There is no rollback: a failed import after a
/// successful export leaves the destination untouched and reports the error.
///
/// # Errors
/// Returns an error when `target` is not the counterpart of `source`, or when
/// the export or import request fails.
pub fn migrate<S, D>(
    source: &WorkspaceClient<S>,
    target: &WorkspaceClient<D>,
    path: &str,
) -> Result<MigrationReport>
where
    S: Transport,
    D: Transport,
{
    let from = source.environment().kind();
    let to = target.environment().kind();
    if to != from.counterpart() {
        return Err(WorkspaceError::EnvironmentMismatch { from, to }.into());
    }

    let export = source.export(path, ExportFormat::Dbc, None)?;
    let import = target.send_import(&export.path, &export.content, ExportFormat::Dbc, false)?;
    match &import {
        ImportStatus::Imported => info!("{} migrated", export.path),
        ImportStatus::Rejected { error_code, .. } => {
            warn!(
                path = %export.path,
                %from,
                %to,
                error_code = error_code.as_str(),
                "migration rejected by destination"
            );
        }
    }
    Ok(MigrationReport {
        path: export.path,
        from,
        to,
        import,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{client, FakeWorkspace, ScriptedTransport};
    use serde_json::json;

    #[test]
    fn copies_content_into_counterpart() -> Result<()> {
        let prod = FakeWorkspace::new().with_file("/Shared/etl", "ZXRs", "dbc");
        let dev = FakeWorkspace::new();
        let source = client(EnvironmentKind::Production, &prod);
        let target = client(EnvironmentKind::NonProduction, &dev);

        let report = migrate(&source, &target, "Shared/etl")?;
        assert_eq!(report.path.as_str(), "/Shared/etl");
        assert_eq!(report.from, EnvironmentKind::Production);
        assert_eq!(report.to, EnvironmentKind::NonProduction);
        assert_eq!(report.import, ImportStatus::Imported);
        assert_eq!(dev.content_of("/Shared/etl").as_deref(), Some("ZXRs"));
        Ok(())
    }

    #[test]
    fn issues_one_export_and_one_non_overwriting_import() -> Result<()> {
        let dev = FakeWorkspace::new().with_file("/nb", "bmI=", "dbc");
        let prod = FakeWorkspace::new();
        migrate(
            &client(EnvironmentKind::NonProduction, &dev),
            &client(EnvironmentKind::Production, &prod),
            "/nb",
        )?;

        let source_calls = dev.calls();
        assert_eq!(source_calls.len(), 1);
        assert_eq!(source_calls[0].action, "workspace/export");
        assert_eq!(source_calls[0].body, json!({"path": "/nb", "format": "DBC"}));

        let target_calls = prod.calls();
        assert_eq!(target_calls.len(), 1);
        assert_eq!(target_calls[0].action, "workspace/import");
        assert_eq!(
            target_calls[0].body,
            json!({"path": "/nb", "format": "DBC", "content": "bmI=", "overwrite": false})
        );
        Ok(())
    }

    #[test]
    fn existing_destination_is_not_clobbered() -> Result<()> {
        let prod = FakeWorkspace::new().with_file("/nb", "bmV3", "dbc");
        let dev = FakeWorkspace::new().with_file("/nb", "b2xk", "dbc");
        let report = migrate(
            &client(EnvironmentKind::Production, &prod),
            &client(EnvironmentKind::NonProduction, &dev),
            "/nb",
        )?;
        assert!(matches!(report.import, ImportStatus::Rejected { .. }));
        assert_eq!(dev.content_of("/nb").as_deref(), Some("b2xk"));
        Ok(())
    }

    #[test]
    fn same_environment_is_refused_before_any_request() {
        let a = FakeWorkspace::new().with_file("/nb", "eA==", "dbc");
        let b = FakeWorkspace::new();
        let err = migrate(
            &client(EnvironmentKind::Production, &a),
            &client(EnvironmentKind::Production, &b),
            "/nb",
        )
        .expect_err("mismatch");
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::EnvironmentMismatch { .. })
        ));
        assert!(a.calls().is_empty());
        assert!(b.calls().is_empty());
    }

    #[test]
    fn import_transport_failure_propagates_after_export() {
        let prod = FakeWorkspace::new().with_file("/nb", "eA==", "dbc");
        let dev = ScriptedTransport::new(vec![Err(anyhow::anyhow!("tls handshake failed"))]);
        let err = migrate(
            &client(EnvironmentKind::Production, &prod),
            &client(EnvironmentKind::NonProduction, &dev),
            "/nb",
        )
        .expect_err("import failure");
        assert_eq!(err.to_string(), "tls handshake failed");
        assert_eq!(prod.calls_to("workspace/export").len(), 1);
    }
}
