use jsonschema::JSONSchema;
use serde_json::Value;

use mockweave_core::{ArrayLength, Schema, SchemaNode, StringGenerator};

use crate::errors::{IssueSeverity, SchemaError, ValidationIssue, ValidationReport};
use crate::schema::document_json_schema_value;

/// Decoded document with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub document: Schema,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a schema document against a document JSON Schema.
pub fn validate_document_json(
    document: &Value,
    document_schema: &Value,
) -> Result<ValidationReport, SchemaError> {
    let compiled = JSONSchema::compile(document_schema)
        .map_err(|err| SchemaError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Lint a decoded document for constructs that are legal but likely wrong.
///
/// Lints never produce errors: contract violations that depend on the
/// generated values are reported by the generator itself.
pub fn lint_document(document: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();
    lint_schema(document, "", &mut report);
    report
}

/// Validate the document end-to-end, returning structured issues on failure.
pub fn validate_document(document: &Value) -> Result<ValidatedDocument, ValidationReport> {
    let structural = match validate_document_json(document, &document_json_schema_value()) {
        Ok(report) => report,
        Err(err) => {
            return Err(ValidationReport::from_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            )));
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let parsed = match Schema::from_json(document) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(ValidationReport::from_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_document_json",
                "/",
                err.to_string(),
                None,
            )));
        }
    };

    let lint = lint_document(&parsed);
    if !lint.is_ok() {
        return Err(lint);
    }

    Ok(ValidatedDocument {
        document: parsed,
        warnings: lint.warnings,
    })
}

fn lint_schema(schema: &Schema, pointer: &str, report: &mut ValidationReport) {
    let Schema::Node(node) = schema else {
        return;
    };
    let common = node.common();

    if common.unique && node.is_constant() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "unique_constant",
            normalized_json_pointer(pointer),
            format!(
                "{} node is unique but always yields the same value",
                node.kind()
            ),
            Some("remove `unique` or generate the value randomly".to_string()),
        ));
    }

    if common.chance_unset.is_some() && !common.optional {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "chance_unset_ignored",
            normalized_json_pointer(&format!("{pointer}/chanceUnset")),
            "chanceUnset has no effect unless optional is true".to_string(),
            Some("set `optional: true`".to_string()),
        ));
    }

    match &**node {
        SchemaNode::Array(array) => {
            if let ArrayLength::Fixed(length) = array.length
                && length < 0
            {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "negative_array_length",
                    normalized_json_pointer(&format!("{pointer}/length")),
                    format!("array length {length} will fail at generation"),
                    None,
                ));
            }
            lint_schema(&array.items, &format!("{pointer}/items"), report);
        }
        SchemaNode::Object(object) => {
            for (key, child) in &object.properties {
                let child_pointer = format!("{pointer}/properties/{}", escape_pointer(key));
                lint_schema(child, &child_pointer, report);
            }
        }
        SchemaNode::OneOf(one_of) => {
            if one_of.elements.is_empty() {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "empty_one_of",
                    normalized_json_pointer(&format!("{pointer}/elements")),
                    "oneOf has no elements and will fail at generation".to_string(),
                    None,
                ));
            }
            for (idx, element) in one_of.elements.iter().enumerate() {
                lint_schema(element, &format!("{pointer}/elements/{idx}"), report);
            }
        }
        SchemaNode::String(string) => {
            if let Some(StringGenerator::Format(format)) = &string.generator {
                for (idx, arg) in format.args.iter().enumerate() {
                    lint_schema(arg, &format!("{pointer}/generator/args/{idx}"), report);
                }
            }
        }
        SchemaNode::Number(_)
        | SchemaNode::Boolean(_)
        | SchemaNode::Date(_)
        | SchemaNode::Reference(_)
        | SchemaNode::Plugin(_) => {}
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_pointer_segments() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
    }

    #[test]
    fn lint_flags_unique_constant_and_ignored_chance() {
        let doc = Schema::from_json(&json!({
            "type": "object",
            "properties": {
                "fixed": {"type": "string", "value": "x", "unique": true},
                "flag": {"type": "boolean", "chance": 0.3, "chanceUnset": 0.2}
            }
        }))
        .expect("parse document");

        let report = lint_document(&doc);
        assert!(report.is_ok());
        let codes: Vec<&str> = report.warnings.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["unique_constant", "chance_unset_ignored"]);
        assert_eq!(report.warnings[0].path, "/properties/fixed");
        assert_eq!(report.warnings[1].path, "/properties/flag/chanceUnset");
    }
}
