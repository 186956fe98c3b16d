use thiserror::Error;

use mockweave_core::SchemaPath;
use mockweave_schema::ValidationReport;

use crate::plugins::PluginError;

/// Errors emitted by the generation engine.
///
/// Every variant aborts the enclosing top-level generation call; no partial
/// value tree is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("schema document failed validation with {} error(s)", .0.errors.len())]
    SchemaValidation(ValidationReport),
    #[error("invalid {kind} schema at {path}: {message}")]
    InvalidSchema {
        kind: &'static str,
        path: String,
        message: String,
    },
    #[error("unresolved reference '{reference}' at {path}: {message}")]
    UnresolvedReference {
        reference: String,
        path: String,
        message: String,
    },
    #[error("failed to load plugin '{plugin}': {message}")]
    PluginLoad { plugin: String, message: String },
    #[error("operation '{operation}' not supported for plugin '{plugin}'")]
    OperationNotSupported {
        operation: &'static str,
        plugin: String,
    },
    #[error("plugin '{plugin}' failed during {operation}: {source}")]
    PluginExecution {
        plugin: String,
        operation: &'static str,
        #[source]
        source: PluginError,
    },
    #[error("no unique value for {path} after {attempts} attempts")]
    UniquenessExhausted { path: String, attempts: u32 },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    pub fn invalid_schema(
        kind: &'static str,
        path: &SchemaPath,
        message: impl Into<String>,
    ) -> Self {
        GenerationError::InvalidSchema {
            kind,
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn unresolved(reference: &str, path: &SchemaPath, message: impl Into<String>) -> Self {
        GenerationError::UnresolvedReference {
            reference: reference.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a plugin failure with the plugin and capability names.
    pub fn from_plugin(plugin: &str, operation: &'static str, err: PluginError) -> Self {
        match err {
            PluginError::Unsupported => GenerationError::OperationNotSupported {
                operation,
                plugin: plugin.to_string(),
            },
            other => GenerationError::PluginExecution {
                plugin: plugin.to_string(),
                operation,
                source: other,
            },
        }
    }
}
