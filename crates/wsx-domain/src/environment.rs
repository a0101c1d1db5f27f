use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentKind {
    Production,
    NonProduction,
}

impl EnvironmentKind {
    /// The environment migrations copy into.
    pub const fn counterpart(self) -> Self {
        match self {
            EnvironmentKind::Production => EnvironmentKind::NonProduction,
            EnvironmentKind::NonProduction => EnvironmentKind::Production,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EnvironmentKind::Production => "prod",
            EnvironmentKind::NonProduction => "dev",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected prod or dev)")]
pub struct UnknownEnvironment(pub String);

impl FromStr for EnvironmentKind {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" | "pd" => Ok(EnvironmentKind::Production),
            "dev" | "nonprod" | "non-production" | "np" => Ok(EnvironmentKind::NonProduction),
            _ => Err(UnknownEnvironment(value.to_string())),
        }
    }
}

/// Credentials and target instance for one environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Environment {
    kind: EnvironmentKind,
    token: String,
    cluster_id: String,
    host: String,
}

impl Environment {
    pub fn new(
        kind: EnvironmentKind,
        token: impl Into<String>,
        cluster_id: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            token: token.into(),
            cluster_id: cluster_id.into(),
            host: host.into(),
        }
    }

    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Base URL for REST actions. Bare hostnames are served over https; a host
    /// that already carries a scheme is used as given.
    pub fn api_base(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/{API_VERSION}/")
        } else {
            format!("https://{host}/{API_VERSION}/")
        }
    }
}

const API_VERSION: &str = "api/2.0";

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("kind", &self.kind)
            .field("token", &"<redacted>")
            .field("cluster_id", &self.cluster_id)
            .field("host", &self.host)
            .finish()
    }
}
