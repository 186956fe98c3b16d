//! Schema-driven synthetic data generation for mockweave.
//!
//! This crate evaluates validated schema documents into JSON value trees:
//! typed generators, `ref:` resolution against scopes and the global value
//! pool, uniqueness, optional nodes and the plugin extension point.

pub mod engine;
pub mod errors;
mod evaluator;
pub mod generators;
pub mod model;
pub mod plugins;
pub mod pool;
pub mod reference;
pub mod serialize;

pub use engine::{GenerationEngine, throttled_progress};
pub use errors::GenerationError;
pub use evaluator::ProgressFn;
pub use model::{
    DEFAULT_MAX_UNIQUE_ATTEMPTS, GenerateOptions, GenerationReport, GenerationResult, Progress,
    ProgressThrottle, RenderedOutput,
};
pub use plugins::{
    BUILTIN_PLUGINS, BuiltinPlugins, NoPlugins, Plugin, PluginError, PluginLoader,
    PluginRegistry, discover_plugins,
};
pub use serialize::serialize_value;
