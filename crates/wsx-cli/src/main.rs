#![deny(clippy::all)]

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
use wsx_core::api::{error_outcome, CommandContext, CommandGroup, CommandInfo, GlobalOptions};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::{CommandGroupCli, WsxCli};
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = WsxCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        config: cli
            .config
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        environment: cli.environment,
    };
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };

    let (info, outcome) = match CommandContext::new(&global) {
        Ok(ctx) => dispatch::dispatch_command(&ctx, &cli.command)?,
        Err(err) => (command_info(&cli.command), error_outcome(&err)),
    };
    let code = emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn command_info(group: &CommandGroupCli) -> CommandInfo {
    let (group, name) = match group {
        CommandGroupCli::Ls(_) => (CommandGroup::Workspace, "ls"),
        CommandGroupCli::Mkdir(_) => (CommandGroup::Workspace, "mkdir"),
        CommandGroupCli::Export(_) => (CommandGroup::Workspace, "export"),
        CommandGroupCli::Import(_) => (CommandGroup::Workspace, "import"),
        CommandGroupCli::Migrate(_) => (CommandGroup::Workspace, "migrate"),
        CommandGroupCli::Run(_) => (CommandGroup::Job, "run"),
        CommandGroupCli::Status(_) => (CommandGroup::Job, "status"),
    };
    CommandInfo::new(group, name)
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env("WSX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!("wsx={level},wsx_core={level},wsx_cli={level}"))
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
