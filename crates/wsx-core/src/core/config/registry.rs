use serde_json::json;
use wsx_domain::{Environment, EnvironmentKind};

use crate::core::tooling::outcome::UserError;

/// The production and non-production instances this process may talk to.
///
/// Migration resolves its destination through [`EnvironmentRegistry::counterpart`]
/// instead of constructing clients on the fly.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    production: Option<Environment>,
    non_production: Option<Environment>,
}

impl EnvironmentRegistry {
    pub fn new(production: Option<Environment>, non_production: Option<Environment>) -> Self {
        Self {
            production,
            non_production,
        }
    }

    /// # Errors
    /// Returns a [`UserError`] naming the variables to set when `kind` has no
    /// credentials configured.
    pub fn get(&self, kind: EnvironmentKind) -> Result<&Environment, UserError> {
        let slot = match kind {
            EnvironmentKind::Production => self.production.as_ref(),
            EnvironmentKind::NonProduction => self.non_production.as_ref(),
        };
        slot.ok_or_else(|| missing_credentials(kind))
    }

    /// # Errors
    /// Returns a [`UserError`] when the counterpart of `kind` is not configured.
    pub fn counterpart(&self, kind: EnvironmentKind) -> Result<&Environment, UserError> {
        self.get(kind.counterpart())
    }

    pub fn configured(&self) -> Vec<EnvironmentKind> {
        let mut kinds = Vec::new();
        if self.production.is_some() {
            kinds.push(EnvironmentKind::Production);
        }
        if self.non_production.is_some() {
            kinds.push(EnvironmentKind::NonProduction);
        }
        kinds
    }
}

fn missing_credentials(kind: EnvironmentKind) -> UserError {
    let prefix = format!("WSX_{}", kind.label().to_ascii_uppercase());
    UserError::new(
        format!("no credentials configured for the {kind} environment"),
        json!({
            "reason": "missing_credentials",
            "environment": kind.label(),
            "hint": format!(
                "Set {prefix}_TOKEN and {prefix}_CLUSTER_ID, or add a [{}] table to the config file.",
                kind.label()
            ),
        }),
    )
}
