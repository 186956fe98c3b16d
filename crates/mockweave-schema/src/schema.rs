use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use mockweave_core::Schema;

/// Emit the JSON Schema for schema documents.
pub fn document_json_schema() -> RootSchema {
    schema_for!(Schema)
}

/// JSON Schema for schema documents as a JSON value, ready to compile.
pub fn document_json_schema_value() -> Value {
    serde_json::to_value(document_json_schema()).unwrap_or(Value::Bool(true))
}
