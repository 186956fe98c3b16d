//! Plugin contract, discovery and the per-call registry.

pub mod builtin;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use mockweave_core::{Schema, SchemaNode, SerializerOptions, StringGenerator};

use crate::errors::GenerationError;

pub use builtin::{BUILTIN_PLUGINS, BuiltinPlugins};

/// Failure reported by a plugin capability.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin does not implement the requested capability.
    #[error("operation not supported")]
    Unsupported,
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("{0}")]
    Failed(String),
}

/// Extension point for custom generation, transformation and serialization.
///
/// Every capability is optional; the defaults report `Unsupported`.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called exactly once per generation call, before any node is evaluated.
    async fn init(&mut self, _args: &Value) -> Result<(), PluginError> {
        Ok(())
    }

    async fn generate(&self, _args: &Value) -> Result<Value, PluginError> {
        Err(PluginError::Unsupported)
    }

    async fn transform(&self, _value: Value, _args: &Value) -> Result<Value, PluginError> {
        Err(PluginError::Unsupported)
    }

    async fn serialize(&self, _value: &Value, _args: &Value) -> Result<String, PluginError> {
        Err(PluginError::Unsupported)
    }
}

/// Resolves plugin names that were not bound explicitly.
pub trait PluginLoader: Send + Sync {
    fn load(&self, name: &str) -> Option<Box<dyn Plugin>>;
}

/// Loader that knows no plugins; only explicit bindings are available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlugins;

impl PluginLoader for NoPlugins {
    fn load(&self, _name: &str) -> Option<Box<dyn Plugin>> {
        None
    }
}

/// Every plugin name the document uses, in first-appearance order, mapped to
/// the init arguments declared under `options.plugins` (null otherwise).
pub fn discover_plugins(root: &Schema) -> IndexMap<String, Value> {
    let mut found: IndexMap<String, Option<Value>> = IndexMap::new();
    collect_plugins(root, &mut found);
    found
        .into_iter()
        .map(|(name, args)| (name, args.unwrap_or(Value::Null)))
        .collect()
}

fn collect_plugins(schema: &Schema, found: &mut IndexMap<String, Option<Value>>) {
    let Schema::Node(node) = schema else {
        return;
    };
    let common = node.common();

    if let Some(options) = &common.options {
        for (name, args) in &options.plugins {
            let slot = found.entry(name.clone()).or_insert(None);
            if slot.is_none() {
                *slot = Some(args.clone());
            }
        }
        if let Some(SerializerOptions::Plugin { plugin_name, .. }) = &options.serializer {
            found.entry(plugin_name.clone()).or_insert(None);
        }
    }
    if let Some(transform) = &common.transform {
        found.entry(transform.clone()).or_insert(None);
    }

    match &**node {
        SchemaNode::Array(array) => collect_plugins(&array.items, found),
        SchemaNode::Object(object) => {
            for property in object.properties.values() {
                collect_plugins(property, found);
            }
        }
        SchemaNode::OneOf(choice) => {
            for element in &choice.elements {
                collect_plugins(element, found);
            }
        }
        SchemaNode::String(string) => {
            if let Some(StringGenerator::Format(format)) = &string.generator {
                for arg in &format.args {
                    collect_plugins(arg, found);
                }
            }
        }
        SchemaNode::Plugin(plugin) => {
            found.entry(plugin.plugin_name.clone()).or_insert(None);
        }
        _ => {}
    }
}

/// Initialized plugins for one generation call.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind explicit plugins, load the remaining names the document uses and
    /// run `init` on each once.
    ///
    /// Explicit bindings win over loader results for the same name.
    pub async fn initialize(
        root: &Schema,
        bindings: Vec<Box<dyn Plugin>>,
        loader: &dyn PluginLoader,
    ) -> Result<Self, GenerationError> {
        let declared = discover_plugins(root);

        let mut plugins: IndexMap<String, Box<dyn Plugin>> = IndexMap::new();
        for plugin in bindings {
            let name = plugin.name().to_string();
            plugins.entry(name).or_insert(plugin);
        }
        for name in declared.keys() {
            if plugins.contains_key(name) {
                continue;
            }
            let plugin = loader.load(name).ok_or_else(|| GenerationError::PluginLoad {
                plugin: name.clone(),
                message: "no plugin is registered under this name".to_string(),
            })?;
            plugins.insert(name.clone(), plugin);
        }

        for (name, plugin) in plugins.iter_mut() {
            let args = declared.get(name).cloned().unwrap_or(Value::Null);
            plugin
                .init(&args)
                .await
                .map_err(|err| GenerationError::from_plugin(name, "init", err))?;
            debug!(plugin = %name, "plugin initialized");
        }

        Ok(Self { plugins })
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<&dyn Plugin, GenerationError> {
        self.plugins
            .get(name)
            .map(|plugin| &**plugin)
            .ok_or_else(|| GenerationError::PluginLoad {
                plugin: name.to_string(),
                message: "plugin was not loaded for this run".to_string(),
            })
    }

    pub async fn generate(&self, name: &str, args: &Value) -> Result<Value, GenerationError> {
        let plugin = self.get(name)?;
        plugin
            .generate(args)
            .await
            .map_err(|err| GenerationError::from_plugin(name, "generate", err))
    }

    pub async fn transform(
        &self,
        name: &str,
        value: Value,
        args: &Value,
    ) -> Result<Value, GenerationError> {
        let plugin = self.get(name)?;
        plugin
            .transform(value, args)
            .await
            .map_err(|err| GenerationError::from_plugin(name, "transform", err))
    }

    pub async fn serialize(
        &self,
        name: &str,
        value: &Value,
        args: &Value,
    ) -> Result<String, GenerationError> {
        let plugin = self.get(name)?;
        plugin
            .serialize(value, args)
            .await
            .map_err(|err| GenerationError::from_plugin(name, "serialize", err))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}
