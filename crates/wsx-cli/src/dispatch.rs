use color_eyre::Result;
use serde_json::{json, Value};
use wsx_core::api::{
    self, CommandContext, CommandGroup, CommandInfo, ExportRequest, ImportRequest, ImportSource,
    ListRequest, MigrateRequest, MkdirRequest, RunParameters, StatusRequest, SubmitRequest,
    UserError,
};

use crate::cli::{CommandGroupCli, ExportArgs, ImportArgs, RunArgs};

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, api::ExecutionOutcome)> {
    match group {
        CommandGroupCli::Ls(args) => {
            let info = CommandInfo::new(CommandGroup::Workspace, "ls");
            let request = ListRequest {
                path: args.path.clone(),
            };
            core_call(info, || api::workspace_list(ctx, &request))
        }
        CommandGroupCli::Mkdir(args) => {
            let info = CommandInfo::new(CommandGroup::Workspace, "mkdir");
            let request = MkdirRequest {
                path: args.path.clone(),
            };
            core_call(info, || api::workspace_mkdir(ctx, &request))
        }
        CommandGroupCli::Export(args) => {
            let info = CommandInfo::new(CommandGroup::Workspace, "export");
            let request = export_request_from_args(args);
            core_call(info, || api::workspace_export(ctx, &request))
        }
        CommandGroupCli::Import(args) => {
            let info = CommandInfo::new(CommandGroup::Workspace, "import");
            let request = import_request_from_args(args);
            core_call(info, || api::workspace_import(ctx, &request))
        }
        CommandGroupCli::Migrate(args) => {
            let info = CommandInfo::new(CommandGroup::Workspace, "migrate");
            let request = MigrateRequest {
                path: args.path.clone(),
            };
            core_call(info, || api::workspace_migrate(ctx, &request))
        }
        CommandGroupCli::Run(args) => {
            let info = CommandInfo::new(CommandGroup::Job, "run");
            core_call(info, || {
                let request = submit_request_from_args(args)?;
                api::job_submit(ctx, &request)
            })
        }
        CommandGroupCli::Status(args) => {
            let info = CommandInfo::new(CommandGroup::Job, "status");
            let request = StatusRequest {
                run_id: args.run_id,
            };
            core_call(info, || api::job_status(ctx, &request))
        }
    }
}

fn core_call<F>(
    info: CommandInfo,
    action: F,
) -> Result<(CommandInfo, api::ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<api::ExecutionOutcome>,
{
    tracing::debug!(group = %info.group, command = info.name, "dispatching");
    let outcome = match action() {
        Ok(result) => result,
        Err(err) => api::error_outcome(&err),
    };
    Ok((info, outcome))
}

fn export_request_from_args(args: &ExportArgs) -> ExportRequest {
    ExportRequest {
        path: args.path.clone(),
        format: args.format,
        save: args.save,
        out_dir: args.out.clone(),
    }
}

fn import_request_from_args(args: &ImportArgs) -> ImportRequest {
    let source = match (&args.file, &args.content) {
        (Some(file), _) => ImportSource::File(file.clone()),
        (None, content) => ImportSource::Content(content.clone().unwrap_or_default()),
    };
    ImportRequest {
        path: args.path.clone(),
        source,
        format: args.format,
        overwrite: args.overwrite,
    }
}

fn submit_request_from_args(args: &RunArgs) -> anyhow::Result<SubmitRequest> {
    let parameters = run_parameters(args.params_json.as_deref(), &args.params)?;
    Ok(SubmitRequest {
        path: args.path.clone(),
        parameters,
        run_name: args.name.clone(),
    })
}

/// Merges `--params-json` with `--param` pairs; the pairs win on conflicts.
fn run_parameters(
    params_json: Option<&str>,
    pairs: &[(String, String)],
) -> anyhow::Result<Option<RunParameters>> {
    let mut parameters = match params_json {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => {
                return Err(UserError::new(
                    "--params-json must be a JSON object",
                    json!({
                        "reason": "invalid_parameters",
                        "value": raw,
                        "hint": "Pass an object such as '{\"date\": \"2024-01-01\", \"limit\": 10}'.",
                    }),
                )
                .into())
            }
        },
        None => None,
    };
    if !pairs.is_empty() {
        let map = parameters.get_or_insert_with(RunParameters::new);
        for (key, value) in pairs {
            map.insert(key.clone(), Value::String(value.clone()));
        }
    }
    Ok(parameters)
}
