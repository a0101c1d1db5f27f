use std::path::PathBuf;

use clap::{value_parser, ArgAction, ArgGroup, Args, Parser, Subcommand};
use wsx_core::api::{EnvironmentKind, ExportFormat};

pub const WSX_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nGlobal options:\n{options}\n";

pub const WSX_BEFORE_HELP: &str = concat!(
    "wsx ",
    env!("CARGO_PKG_VERSION"),
    " – Workspace and job client\n\n",
    "\x1b[1;36mWorkspace\x1b[0m\n",
    "  ls               List every object under a workspace path.\n",
    "  mkdir            Create a directory (and missing parents).\n",
    "  export           Download an object; --save writes it to the export directory.\n",
    "  import           Upload a local file or base64 content to a path.\n",
    "  migrate          Copy a path into the counterpart environment (never overwrites).\n\n",
    "\x1b[1;36mJobs\x1b[0m\n",
    "  run              Submit a notebook as a one-off run on the environment's cluster.\n",
    "  status           Show the runs of the job that owns a run id.\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = WSX_BEFORE_HELP,
    help_template = WSX_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct WsxCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        value_parser = value_parser!(PathBuf),
        help = "Optional TOML config file with [prod] and [dev] tables",
        global = true
    )]
    pub config: Option<PathBuf>,
    #[arg(
        short = 'e',
        long = "env",
        value_name = "ENV",
        value_parser = parse_environment,
        default_value = "dev",
        help = "Environment to act on: prod or dev",
        global = true
    )]
    pub environment: EnvironmentKind,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "List every object under a workspace path, descending into directories.",
        override_usage = "wsx ls <PATH>",
        after_help = "Examples:\n  wsx ls /Shared\n  wsx --env prod --json ls /Repos/etl\n"
    )]
    Ls(PathArgs),
    #[command(
        about = "Create a workspace directory and any missing parents.",
        override_usage = "wsx mkdir <PATH>",
        after_help = "Example:\n  wsx mkdir /Shared/reports/2024\n"
    )]
    Mkdir(PathArgs),
    #[command(
        about = "Export a notebook or directory as base64 content.",
        override_usage = "wsx export <PATH> [--format FORMAT] [--save] [--out DIR]",
        after_help = "Examples:\n  wsx export /Shared/etl --save\n  wsx export /Shared/etl/load --format SOURCE --save --out ./backup\n"
    )]
    Export(ExportArgs),
    #[command(
        about = "Import a local file or base64 content into the workspace.",
        override_usage = "wsx import <PATH> (--file FILE | --content B64) [--format FORMAT] [--overwrite]",
        after_help = "Examples:\n  wsx import /Shared/etl --file etl.dbc\n  wsx import /Shared/etl/load --file load.py --format SOURCE --overwrite\n"
    )]
    Import(ImportArgs),
    #[command(
        about = "Copy a path from the selected environment into its counterpart.",
        override_usage = "wsx migrate <PATH>",
        after_help = "Examples:\n  wsx --env dev migrate /Shared/etl\n  wsx --env prod migrate /Shared/etl\n"
    )]
    Migrate(PathArgs),
    #[command(
        about = "Submit a notebook as a one-off run on the environment's cluster.",
        override_usage = "wsx run <PATH> [--param KEY=VALUE]... [--params-json JSON] [--name NAME]",
        after_help = "Examples:\n  wsx run /Shared/etl/load --param date=2024-01-01\n  wsx run /Shared/etl/load --params-json '{\"limit\": 10}'\n"
    )]
    Run(RunArgs),
    #[command(
        about = "Show the runs of the job that owns a run id.",
        override_usage = "wsx status <RUN_ID>",
        after_help = "Example:\n  wsx --json status 1234\n"
    )]
    Status(StatusArgs),
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[arg(value_name = "PATH", help = "Workspace path; a leading / is added when missing")]
    pub path: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(value_name = "PATH")]
    pub path: String,
    #[arg(
        long,
        value_name = "FORMAT",
        value_parser = parse_format,
        default_value = "DBC",
        help = "SOURCE, HTML, JUPYTER or DBC (directories require DBC)"
    )]
    pub format: ExportFormat,
    #[arg(long, help = "Also write the decoded content to the export directory")]
    pub save: bool,
    #[arg(
        long,
        value_name = "DIR",
        value_parser = value_parser!(PathBuf),
        requires = "save",
        help = "Export directory (defaults to WSX_EXPORT_DIR or the downloads folder)"
    )]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "content"])))]
pub struct ImportArgs {
    #[arg(value_name = "PATH")]
    pub path: String,
    #[arg(long, value_name = "FILE", value_parser = value_parser!(PathBuf))]
    pub file: Option<PathBuf>,
    #[arg(long, value_name = "B64", help = "Base64 content to upload as-is")]
    pub content: Option<String>,
    #[arg(
        long,
        value_name = "FORMAT",
        value_parser = parse_format,
        default_value = "DBC",
        help = "SOURCE, HTML, JUPYTER or DBC"
    )]
    pub format: ExportFormat,
    #[arg(long, help = "Replace an existing object at PATH")]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(value_name = "PATH")]
    pub path: String,
    #[arg(
        short = 'p',
        long = "param",
        value_name = "KEY=VALUE",
        value_parser = parse_param,
        help = "Notebook parameter (repeatable)"
    )]
    pub params: Vec<(String, String)>,
    #[arg(
        long = "params-json",
        value_name = "JSON",
        help = "JSON object of parameters; non-string values are sent as JSON text"
    )]
    pub params_json: Option<String>,
    #[arg(long, value_name = "NAME", help = "Run name (defaults to WSX_RUN_PREFIX + notebook name)")]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(value_name = "RUN_ID")]
    pub run_id: u64,
}

fn parse_environment(raw: &str) -> Result<EnvironmentKind, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
