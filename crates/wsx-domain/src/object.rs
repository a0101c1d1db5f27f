use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    Directory,
    Other(String),
}

impl ObjectType {
    pub fn from_remote(raw: &str) -> Self {
        if raw == "DIRECTORY" {
            ObjectType::Directory
        } else {
            ObjectType::Other(raw.to_string())
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ObjectType::Directory)
    }
}

/// One row of a workspace listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub path: String,
    pub object_type: ObjectType,
}

/// Transfer encodings accepted by the export/import endpoints.
///
/// Directories can only be moved as [`ExportFormat::Dbc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Source,
    Html,
    Jupyter,
    #[default]
    Dbc,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Source,
        ExportFormat::Html,
        ExportFormat::Jupyter,
        ExportFormat::Dbc,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Source => "SOURCE",
            ExportFormat::Html => "HTML",
            ExportFormat::Jupyter => "JUPYTER",
            ExportFormat::Dbc => "DBC",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format '{0}' (expected SOURCE, HTML, JUPYTER or DBC)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownFormat(value.to_string()))
    }
}
