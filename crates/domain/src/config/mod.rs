pub mod graph;
pub mod logging;
pub mod options;
pub mod root;
pub mod scope;
pub mod transformations;

pub use graph::GraphConfig;
pub use logging::LoggingConfig;
pub use options::{EnumOptions, SourceFilter};
pub use root::{CliOverrides, Config};
pub use scope::ScopeConfig;
pub use transformations::{Transformation, TransformationsConfig};
