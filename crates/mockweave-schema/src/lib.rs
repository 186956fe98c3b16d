//! Validation gate for mockweave schema documents.
//!
//! Documents are checked structurally against the JSON Schema derived from
//! the `mockweave-core` model, decoded, and linted for suspicious but legal
//! constructs. Issues carry a JSON pointer and a machine-readable code.

pub mod errors;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, Result, SchemaError, ValidationIssue, ValidationReport};
pub use schema::{document_json_schema, document_json_schema_value};
pub use validate::{ValidatedDocument, lint_document, validate_document, validate_document_json};
