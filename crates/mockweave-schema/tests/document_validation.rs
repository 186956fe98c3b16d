use mockweave_schema::{
    document_json_schema_value, validate_document, validate_document_json,
};
use serde_json::json;

#[test]
fn nested_document_validates() {
    let doc = json!({
        "type": "object",
        "options": {"ignoreNotFoundGlobalRefs": true, "plugins": {"counter": {"start": 10}}},
        "properties": {
            "users": {
                "type": "array",
                "length": {"min": 1, "max": 3},
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "generator": {"type": "uuid"}, "unique": true},
                        "age": {"type": "number", "min": 18, "max": 90, "decimalPlaces": 0},
                        "active": {"type": "boolean", "chance": 0.8},
                        "joined": {"type": "date", "min": "2020-01-01", "max": "2024-01-01"},
                        "seq": {"type": "plugin", "pluginName": "counter"},
                        "label": {
                            "type": "string",
                            "generator": {
                                "type": "format",
                                "format": "{1}-{2}",
                                "args": ["user", {"type": "number", "value": 1}]
                            }
                        }
                    }
                }
            },
            "owner": {"type": "reference", "ref": "users.id", "except": ["ref:./nobody"]},
            "kind": {"type": "oneOf", "elements": ["a", "b", 3, null, true]},
            "alias": "ref:users.id"
        }
    });

    let validated = validate_document(&doc).expect("document should validate");
    assert!(validated.warnings.is_empty(), "unexpected warnings");
}

#[test]
fn unknown_node_type_is_structural_error() {
    let doc = json!({
        "type": "object",
        "properties": {
            "broken": {"type": "matrix", "rows": 3}
        }
    });

    let report = validate_document(&doc).expect_err("unknown type must fail");
    assert!(!report.is_ok());
    assert!(
        report
            .errors
            .iter()
            .all(|issue| issue.code == "schema_violation")
    );
}

#[test]
fn chance_unset_out_of_range_is_rejected() {
    let doc = json!({"type": "number", "optional": true, "chanceUnset": 1.5});
    let structural =
        validate_document_json(&doc, &document_json_schema_value()).expect("compile schema");
    assert!(!structural.is_ok());
}

#[test]
fn array_without_items_is_rejected() {
    let doc = json!({"type": "array", "length": 2});
    let report = validate_document(&doc).expect_err("missing items must fail");
    assert!(!report.errors.is_empty());
}

#[test]
fn bare_literal_documents_are_valid() {
    for doc in [json!("plain"), json!(42), json!(null), json!(false)] {
        validate_document(&doc).expect("literal should validate");
    }
}
