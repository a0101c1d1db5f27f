#![deny(clippy::all)]
#![allow(clippy::must_use_candidate)]

pub mod environment;
pub mod job;
pub mod object;
pub mod path;

pub use environment::{Environment, EnvironmentKind, UnknownEnvironment};
pub use job::{coerce_parameters, default_run_name, RunParameters};
pub use object::{ExportFormat, NamespaceEntry, ObjectType, UnknownFormat};
pub use path::{InvalidPathError, WorkspacePath};
