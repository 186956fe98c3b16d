use serde_json::json;

use mockweave_generate::{GenerateOptions, GenerationEngine, GenerationError};

fn engine(seed: u64) -> GenerationEngine {
    GenerationEngine::new(GenerateOptions {
        seed: Some(seed),
        ..GenerateOptions::default()
    })
}

#[tokio::test]
async fn local_reference_reads_a_completed_sibling() {
    let doc = json!({
        "type": "object",
        "properties": {"a": "x", "b": "ref:./a"}
    });

    let value = engine(1).generate(&doc, Vec::new()).await.expect("generate");
    assert_eq!(value, json!({"a": "x", "b": "x"}));
}

#[tokio::test]
async fn parent_reference_climbs_one_composite() {
    let doc = json!({
        "type": "object",
        "properties": {
            "tenant": "acme",
            "users": {
                "type": "array",
                "length": 2,
                "items": {
                    "type": "object",
                    "properties": {"tenant": "ref:../../tenant"}
                }
            }
        }
    });

    let value = engine(2).generate(&doc, Vec::new()).await.expect("generate");
    assert_eq!(value["users"], json!([{"tenant": "acme"}, {"tenant": "acme"}]));
}

#[tokio::test]
async fn reference_except_removes_excluded_values() {
    let doc = json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "length": 3,
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "number", "min": 1, "max": 3, "step": 1, "unique": true}
                    }
                }
            },
            "excludeId": 2,
            "pick": {"type": "reference", "ref": "items.id", "except": ["ref:./excludeId"]}
        }
    });

    for seed in 0..16 {
        let value = engine(seed).generate(&doc, Vec::new()).await.expect("generate");
        let pick = &value["pick"];
        assert!(pick == &json!(1) || pick == &json!(3), "seed {seed} picked {pick}");
    }
}

#[tokio::test]
async fn global_reference_picks_a_pooled_value() {
    let doc = json!({
        "type": "object",
        "properties": {
            "users": {
                "type": "array",
                "length": 3,
                "items": {
                    "type": "object",
                    "properties": {"id": {"type": "string", "generator": {"type": "uuid"}}}
                }
            },
            "owner": "ref:users.id"
        }
    });

    let value = engine(3).generate(&doc, Vec::new()).await.expect("generate");
    let ids: Vec<&serde_json::Value> = value["users"]
        .as_array()
        .expect("users")
        .iter()
        .map(|user| &user["id"])
        .collect();
    assert!(ids.contains(&&value["owner"]));
}

#[tokio::test]
async fn do_not_reference_self_skips_the_sibling_value() {
    let doc = json!({
        "type": "array",
        "length": 2,
        "options": {"doNotReferenceSelf": true},
        "items": {
            "type": "object",
            "properties": {
                "id": {"type": "number", "min": 1, "max": 1000000, "step": 1, "unique": true},
                "friend": "ref:id"
            }
        }
    });

    let value = engine(4).generate(&doc, Vec::new()).await.expect("generate");
    assert_eq!(value[0]["friend"], json!(null));
    assert_eq!(value[1]["friend"], value[0]["id"]);
}

#[tokio::test]
async fn unknown_global_path_is_an_error_unless_ignored() {
    let strict = json!({
        "type": "object",
        "properties": {"owner": "ref:users.id"}
    });
    let err = engine(5).generate(&strict, Vec::new()).await.expect_err("unresolved");
    match err {
        GenerationError::UnresolvedReference { reference, path, .. } => {
            assert_eq!(reference, "ref:users.id");
            assert_eq!(path, "owner");
        }
        other => panic!("unexpected error: {other}"),
    }

    let lenient = json!({
        "type": "object",
        "options": {"ignoreNotFoundGlobalRefs": true, "notFoundRefValue": "none"},
        "properties": {"owner": "ref:users.id"}
    });
    let value = engine(5).generate(&lenient, Vec::new()).await.expect("generate");
    assert_eq!(value, json!({"owner": "none"}));
}

#[tokio::test]
async fn missing_local_path_honors_nested_options() {
    let doc = json!({
        "type": "object",
        "options": {"ignoreNotFoundLocalRefs": true},
        "properties": {
            "loose": "ref:./missing",
            "strict": {
                "type": "object",
                "options": {"ignoreNotFoundLocalRefs": false},
                "properties": {"value": "ref:./missing"}
            }
        }
    });

    let err = engine(6).generate(&doc, Vec::new()).await.expect_err("nested override");
    assert!(matches!(
        err,
        GenerationError::UnresolvedReference { ref path, .. } if path == "strict.value"
    ));
}

#[tokio::test]
async fn climbing_above_the_root_is_always_an_error() {
    let doc = json!({
        "type": "object",
        "options": {"ignoreNotFoundLocalRefs": true},
        "properties": {"a": "ref:../../x"}
    });

    let err = engine(7).generate(&doc, Vec::new()).await.expect_err("above root");
    assert!(matches!(err, GenerationError::UnresolvedReference { .. }));
}

#[tokio::test]
async fn email_parameters_resolve_through_references() {
    let doc = json!({
        "type": "object",
        "properties": {
            "first": "Ana",
            "last": "Silva",
            "email": {
                "type": "string",
                "generator": {
                    "type": "email",
                    "firstName": "ref:./first",
                    "lastName": "ref:./last",
                    "domain": "example.org"
                }
            }
        }
    });

    let value = engine(8).generate(&doc, Vec::new()).await.expect("generate");
    let email = value["email"].as_str().expect("email");
    assert!(email.starts_with("ana"), "{email}");
    assert!(email.contains("silva"), "{email}");
    assert!(email.ends_with("@example.org"), "{email}");
}

#[tokio::test]
async fn global_reference_ignores_format_arguments() {
    let doc = json!({
        "type": "object",
        "properties": {
            "users": {
                "type": "array",
                "length": 2,
                "items": {
                    "type": "object",
                    "properties": {
                        "email": {
                            "type": "string",
                            "generator": {
                                "type": "format",
                                "format": "{1}@{2}",
                                "args": [
                                    {"type": "string", "value": "alice"},
                                    {"type": "string", "value": "x.org"}
                                ]
                            }
                        }
                    }
                }
            },
            "contact": "ref:users.email"
        }
    });

    for seed in 0..20 {
        let value = engine(seed).generate(&doc, Vec::new()).await.expect("generate");
        assert_eq!(value["contact"], json!("alice@x.org"), "seed {seed}");
    }
}

#[tokio::test]
async fn global_reference_to_an_array_yields_whole_arrays() {
    let doc = json!({
        "type": "object",
        "properties": {
            "nums": {"type": "array", "length": 3, "items": {"type": "number", "value": 5}},
            "copy": "ref:nums"
        }
    });

    for seed in 0..20 {
        let value = engine(seed).generate(&doc, Vec::new()).await.expect("generate");
        assert_eq!(value["copy"], json!([5, 5, 5]), "seed {seed}");
    }
}

#[tokio::test]
async fn unique_format_does_not_collide_with_its_own_argument() {
    let doc = json!({
        "type": "array",
        "length": 5,
        "items": {
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "unique": true,
                    "generator": {
                        "type": "format",
                        "format": "{1}",
                        "args": [{"type": "string", "generator": {"type": "uuid"}}]
                    }
                }
            }
        }
    });

    let value = engine(21).generate(&doc, Vec::new()).await.expect("generate");
    let codes: std::collections::HashSet<&str> = value
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|item| item["code"].as_str())
        .collect();
    assert_eq!(codes.len(), 5);
}
