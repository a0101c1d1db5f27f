use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wsx_domain::{Environment, EnvironmentKind};

use super::registry::EnvironmentRegistry;
use crate::core::tooling::outcome::UserError;
use crate::core::workspace::DEFAULT_RUN_PREFIX;

pub(crate) const DEFAULT_HOST: &str = "southeastasia.azuredatabricks.net";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub config: Option<String>,
    pub environment: EnvironmentKind,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Returns the variable when it is set to something other than blanks.
    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Optional TOML configuration file; environment variables take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    host: Option<String>,
    export_dir: Option<PathBuf>,
    run_prefix: Option<String>,
    timeout_secs: Option<u64>,
    prod: Option<FileEnvironment>,
    dev: Option<FileEnvironment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileEnvironment {
    token: Option<String>,
    cluster_id: Option<String>,
    host: Option<String>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, toml_edit::de::Error> {
        toml_edit::de::from_str(contents)
    }

    fn environment(&self, kind: EnvironmentKind) -> Option<&FileEnvironment> {
        match kind {
            EnvironmentKind::Production => self.prod.as_ref(),
            EnvironmentKind::NonProduction => self.dev.as_ref(),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) registry: EnvironmentRegistry,
    pub(crate) export_dir: PathBuf,
    pub(crate) run_prefix: String,
    pub(crate) timeout: Duration,
}

impl Config {
    /// Builds a configuration snapshot from the process environment and the
    /// config file named in `global`, if any.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed, or a
    /// setting holds an invalid value.
    pub fn load(global: &GlobalOptions) -> Result<Self> {
        let snapshot = EnvSnapshot::capture();
        let file = match global.config.as_deref() {
            Some(path) => FileConfig::load(Path::new(path)).map_err(|err| {
                UserError::new(
                    format!("{err:#}"),
                    json!({
                        "reason": "invalid_config",
                        "path": path,
                        "hint": "Config files accept host, export_dir, run_prefix, timeout_secs and [prod]/[dev] tables.",
                    }),
                )
            })?,
            None => FileConfig::default(),
        };
        Ok(Self::from_sources(&snapshot, &file)?)
    }

    pub(crate) fn from_sources(
        snapshot: &EnvSnapshot,
        file: &FileConfig,
    ) -> Result<Self, UserError> {
        let default_host = snapshot
            .var("WSX_HOST")
            .map(ToOwned::to_owned)
            .or_else(|| file.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let registry = EnvironmentRegistry::new(
            resolve_environment(EnvironmentKind::Production, snapshot, file, &default_host),
            resolve_environment(EnvironmentKind::NonProduction, snapshot, file, &default_host),
        );
        let export_dir = snapshot
            .var("WSX_EXPORT_DIR")
            .map(PathBuf::from)
            .or_else(|| file.export_dir.clone())
            .or_else(dirs_next::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let run_prefix = snapshot
            .var("WSX_RUN_PREFIX")
            .map(ToOwned::to_owned)
            .or_else(|| file.run_prefix.clone())
            .unwrap_or_else(|| DEFAULT_RUN_PREFIX.to_string());
        let timeout_secs = match snapshot.var("WSX_HTTP_TIMEOUT") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                UserError::new(
                    format!("WSX_HTTP_TIMEOUT must be a whole number of seconds, got '{raw}'"),
                    json!({
                        "reason": "invalid_config",
                        "setting": "WSX_HTTP_TIMEOUT",
                        "value": raw,
                    }),
                )
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(UserError::new(
                "the HTTP timeout must be at least one second",
                json!({
                    "reason": "invalid_config",
                    "setting": "WSX_HTTP_TIMEOUT",
                    "value": timeout_secs,
                    "hint": "Set WSX_HTTP_TIMEOUT or timeout_secs to a positive number of seconds.",
                }),
            ));
        }
        Ok(Self {
            registry,
            export_dir,
            run_prefix,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    #[must_use]
    pub fn run_prefix(&self) -> &str {
        &self.run_prefix
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn resolve_environment(
    kind: EnvironmentKind,
    snapshot: &EnvSnapshot,
    file: &FileConfig,
    default_host: &str,
) -> Option<Environment> {
    let prefix = format!("WSX_{}", kind.label().to_ascii_uppercase());
    let section = file.environment(kind);
    let pick = |suffix: &str, from_file: Option<&String>| {
        snapshot
            .var(&format!("{prefix}_{suffix}"))
            .map(ToOwned::to_owned)
            .or_else(|| from_file.cloned())
    };
    let token = pick("TOKEN", section.and_then(|s| s.token.as_ref()))?;
    let cluster_id =
        pick("CLUSTER_ID", section.and_then(|s| s.cluster_id.as_ref())).unwrap_or_default();
    let host = pick("HOST", section.and_then(|s| s.host.as_ref()))
        .unwrap_or_else(|| default_host.to_string());
    Some(Environment::new(kind, token, cluster_id, host))
}
