use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use wsx_domain::{Environment, EnvironmentKind};

use super::{Config, GlobalOptions};
use crate::core::workspace::{DirectorySink, WorkspaceClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Workspace,
    Job,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Workspace => "workspace",
            CommandGroup::Job => "job",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
}

impl<'a> CommandContext<'a> {
    /// Creates a new command context with the provided global options.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded.
    pub fn new(global: &'a GlobalOptions) -> Result<Self> {
        let config = Config::load(global)?;
        Ok(Self { global, config })
    }

    #[must_use]
    pub fn with_config(global: &'a GlobalOptions, config: Config) -> Self {
        Self { global, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn environment(&self) -> EnvironmentKind {
        self.global.environment
    }

    /// Connects to the configured instance for `kind`.
    ///
    /// # Errors
    /// Returns an error if `kind` has no credentials or the transport cannot
    /// be built.
    pub fn client(&self, kind: EnvironmentKind) -> Result<WorkspaceClient> {
        self.connect(self.config.registry().get(kind)?)
    }

    /// # Errors
    /// See [`CommandContext::client`].
    pub fn active_client(&self) -> Result<WorkspaceClient> {
        self.client(self.environment())
    }

    /// # Errors
    /// See [`CommandContext::client`].
    pub fn counterpart_client(&self) -> Result<WorkspaceClient> {
        self.connect(self.config.registry().counterpart(self.environment())?)
    }

    fn connect(&self, environment: &Environment) -> Result<WorkspaceClient> {
        let client = WorkspaceClient::connect(environment.clone(), self.config.timeout())?
            .with_run_prefix(self.config.run_prefix());
        Ok(client)
    }

    pub fn export_sink(&self, dir: Option<&Path>) -> DirectorySink {
        DirectorySink::new(dir.unwrap_or_else(|| self.config.export_dir()))
    }
}
