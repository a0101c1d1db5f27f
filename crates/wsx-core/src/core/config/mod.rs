pub mod context;
pub mod registry;
pub mod settings;

pub use registry::EnvironmentRegistry;
pub use settings::{Config, GlobalOptions};
