use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generation options attached to a node and inherited by its subtree.
///
/// Unset fields fall back to the nearest ancestor that declares them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaOptions {
    /// Plugins to load, mapped to the arguments passed to their `init`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub plugins: IndexMap<String, Value>,
    /// Substitute `notFoundRefValue` for unreachable local references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_not_found_local_refs: Option<bool>,
    /// Substitute `notFoundRefValue` for unknown global reference paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_not_found_global_refs: Option<bool>,
    /// Exclude the node's own sibling value from global reference candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_reference_self: Option<bool>,
    /// Fallback for references that cannot be resolved. Defaults to null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_ref_value: Option<Value>,
    /// Serializer used by hosts that turn the generated tree into text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer: Option<SerializerOptions>,
}

impl SchemaOptions {
    /// Overlay `self` on top of `inherited`: fields declared here win.
    pub fn merged_over(&self, inherited: &SchemaOptions) -> SchemaOptions {
        let mut plugins = inherited.plugins.clone();
        for (name, args) in &self.plugins {
            plugins.insert(name.clone(), args.clone());
        }

        SchemaOptions {
            plugins,
            ignore_not_found_local_refs: self
                .ignore_not_found_local_refs
                .or(inherited.ignore_not_found_local_refs),
            ignore_not_found_global_refs: self
                .ignore_not_found_global_refs
                .or(inherited.ignore_not_found_global_refs),
            do_not_reference_self: self
                .do_not_reference_self
                .or(inherited.do_not_reference_self),
            not_found_ref_value: self
                .not_found_ref_value
                .clone()
                .or_else(|| inherited.not_found_ref_value.clone()),
            serializer: self
                .serializer
                .clone()
                .or_else(|| inherited.serializer.clone()),
        }
    }

    pub fn ignores_local_refs(&self) -> bool {
        self.ignore_not_found_local_refs.unwrap_or(false)
    }

    pub fn ignores_global_refs(&self) -> bool {
        self.ignore_not_found_global_refs.unwrap_or(false)
    }

    pub fn excludes_self(&self) -> bool {
        self.do_not_reference_self.unwrap_or(false)
    }

    pub fn not_found_value(&self) -> Value {
        self.not_found_ref_value.clone().unwrap_or(Value::Null)
    }
}

/// Output format for the generated value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SerializerOptions {
    /// JSON text, compact unless `pretty` is set.
    Json {
        #[serde(default)]
        pretty: bool,
    },
    /// Delegate to the `serialize` capability of a plugin.
    Plugin {
        #[serde(rename = "pluginName")]
        plugin_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Value>,
    },
}

impl Default for SerializerOptions {
    fn default() -> Self {
        SerializerOptions::Json { pretty: false }
    }
}
