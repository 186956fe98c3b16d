use serde_json::Value;

use mockweave_core::SerializerOptions;

use crate::errors::GenerationError;
use crate::plugins::PluginRegistry;

/// Turn a generated tree into text. The plugin variant calls the plugin's
/// `serialize` capability, so the plugin must be loaded in `plugins`.
pub async fn serialize_value(
    value: &Value,
    serializer: &SerializerOptions,
    plugins: &PluginRegistry,
) -> Result<String, GenerationError> {
    match serializer {
        SerializerOptions::Json { pretty: true } => Ok(serde_json::to_string_pretty(value)?),
        SerializerOptions::Json { pretty: false } => Ok(serde_json::to_string(value)?),
        SerializerOptions::Plugin { plugin_name, args } => {
            let args = args.clone().unwrap_or(Value::Null);
            plugins.serialize(plugin_name, value, &args).await
        }
    }
}
